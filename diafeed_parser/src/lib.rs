pub mod aligner;
pub mod decoder;
pub mod emitter;
pub mod error;
pub mod pipeline;
pub mod profile;
pub mod record;
pub mod reference;
pub mod source;

use std::path::PathBuf;

use chrono::prelude::*;
use clap::Parser;

pub use error::{Error, Result};
pub use pipeline::{convert, ConversionReport, ConversionRequest};
pub use profile::{FormatProfile, MismatchPolicy, Preset};
pub use source::InputEncoding;

/// Converts the operator's master table export into a schedule feed.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Opt {
    /// Directory holding the master tables.
    #[arg(default_value = "input")]
    pub input_dir: PathBuf,

    /// Directory the feed is written to, created if absent.
    #[arg(short = 'o', long, default_value = "output")]
    pub out: PathBuf,

    /// RON format profile. Overrides --preset.
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Current)]
    pub preset: Preset,

    /// Overrides the profile's policy.
    #[arg(long, value_enum)]
    pub on_mismatch: Option<MismatchPolicy>,

    #[arg(long, value_enum, default_value_t = InputEncoding::ShiftJis)]
    pub encoding: InputEncoding,

    /// Processing date anchoring the feed window, today by default.
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// -v for info, -vv for debug.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl std::fmt::Display for Opt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "== Diafeed Options ==")?;
        writeln!(f, "input: {}", self.input_dir.display())?;
        writeln!(f, "output: {}", self.out.display())?;
        match &self.profile {
            Some(path) => writeln!(f, "profile file: {}", path.display())?,
            None => writeln!(f, "preset: {:?}", self.preset)?,
        }
        if let Some(policy) = self.on_mismatch {
            writeln!(f, "on mismatch: {policy:?}")?;
        }
        writeln!(f, "encoding: {:?}", self.encoding)?;
        match self.today {
            Some(date) => writeln!(f, "processing date: {date}"),
            None => writeln!(f, "processing date: today"),
        }
    }
}

impl Opt {
    pub fn format_profile(&self) -> Result<FormatProfile> {
        let mut profile = match &self.profile {
            Some(path) => FormatProfile::from_ron_file(path)?,
            None => FormatProfile::preset(self.preset),
        };
        if let Some(policy) = self.on_mismatch {
            profile.on_mismatch = policy;
        }
        Ok(profile)
    }

    pub fn request(&self) -> Result<ConversionRequest> {
        Ok(ConversionRequest {
            input_dir: self.input_dir.clone(),
            out_dir: self.out.clone(),
            profile: self.format_profile()?,
            encoding: self.encoding,
            today: self.today.unwrap_or_else(|| Local::now().date_naive()),
        })
    }
}

pub struct DiafeedConverter {
    pub spinner: spinoff::Spinner,
}

impl Default for DiafeedConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiafeedConverter {
    pub fn new() -> Self {
        Self {
            spinner: spinoff::Spinner::new(spinoff::spinners::Dots, "Reading profile", None),
        }
    }

    /// Runs the conversion and prints its summary. A run halted on an
    /// alignment mismatch still writes the whole feed, then fails with
    /// that mismatch.
    pub fn run_with_opt(&mut self, opt: &Opt) -> Result<ConversionReport> {
        let report = match opt.request().and_then(|request| self.run_pipeline(&request)) {
            Ok(report) => report,
            Err(err) => {
                self.spinner.fail(&err.to_string());
                return Err(err);
            }
        };

        match report.halting_mismatch() {
            Some(mismatch) => {
                self.spinner.fail("Alignment halted");
                println!("{report}");
                Err(mismatch.clone().into())
            }
            None => {
                self.spinner
                    .success(&format!("Feed written to {}", opt.out.display()));
                println!("{report}");
                Ok(report)
            }
        }
    }

    fn run_pipeline(&mut self, request: &ConversionRequest) -> Result<ConversionReport> {
        let spinner = &mut self.spinner;
        convert(request, &mut |phase| spinner.update_text(phase))
    }
}
