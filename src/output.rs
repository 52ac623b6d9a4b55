use std::io::{self, Write};

use serde::Serialize;

use crate::app::ProfileDataResult;
use crate::counts::AltCount;
use crate::domain::{Cohort, Gene, Profile};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_profile_data(result: &ProfileDataResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_counts(counts: &[AltCount]) -> io::Result<()> {
        Self::print_json(&counts)
    }

    pub fn print_profiles(profiles: &[Profile]) -> io::Result<()> {
        Self::print_json(&profiles)
    }

    pub fn print_cohorts(cohorts: &[Cohort]) -> io::Result<()> {
        Self::print_json(&cohorts)
    }

    pub fn print_genes(genes: &[Gene]) -> io::Result<()> {
        Self::print_json(&genes)
    }

    pub fn render<T: Serialize>(value: &T) -> io::Result<String> {
        serde_json::to_string_pretty(value).map_err(io::Error::other)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = Self::render(value)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
