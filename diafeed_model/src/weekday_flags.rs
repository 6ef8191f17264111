use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct WeekdayFlags: u8 {
        const NEVER = 0;
        const MONDAY =    0b1;
        const TUESDAY =   0b1 << 1;
        const WEDNESDAY = 0b1 << 2;
        const THURSDAY =  0b1 << 3;
        const FRIDAY =    0b1 << 4;
        const SATURDAY =  0b1 << 5;
        const SUNDAY =    0b1 << 6;

        const WORKDAYS = 0b11111;
    }
}

impl WeekdayFlags {
    /// Monday first, the order of the day columns in `calendar.txt`.
    pub const COLUMN_ORDER: [WeekdayFlags; 7] = [
        WeekdayFlags::MONDAY,
        WeekdayFlags::TUESDAY,
        WeekdayFlags::WEDNESDAY,
        WeekdayFlags::THURSDAY,
        WeekdayFlags::FRIDAY,
        WeekdayFlags::SATURDAY,
        WeekdayFlags::SUNDAY,
    ];

    /// One `0`/`1` flag per day, Monday first.
    pub fn columns(&self) -> [u8; 7] {
        Self::COLUMN_ORDER.map(|day| u8::from(self.contains(day)))
    }
}

impl Display for WeekdayFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::NEVER {
            return write!(f, "Never runs.");
        }
        for (day, letter) in Self::COLUMN_ORDER.iter().zip("MTWTFSS".chars()) {
            let char = if self.contains(*day) { letter } else { '-' };
            write!(f, "{char}")?;
        }
        Ok(())
    }
}
