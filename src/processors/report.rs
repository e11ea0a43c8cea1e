/// What became of the optional clean-record cache
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CacheOutcome {
    #[default]
    Disabled,
    Written(String),
    Failed(String),
}

/// Counters collected while cleaning one load
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub input_records: usize,
    pub missing_values: usize,
    pub missing_pollutants: usize,
    pub invalid_start_timestamps: usize,
    pub invalid_end_timestamps: usize,
    pub duplicates_removed: usize,
    pub organizations_filled: usize,
    pub unmapped_departments: usize,
    pub clean_records: usize,
    pub corpus_mean: Option<f64>,
    pub corpus_std: Option<f64>,
    pub cache: CacheOutcome,
}

impl CleaningReport {
    pub fn dropped_records(&self) -> usize {
        self.missing_values + self.missing_pollutants + self.duplicates_removed
    }

    fn share(&self, count: usize) -> f64 {
        if self.input_records == 0 {
            0.0
        } else {
            100.0 * count as f64 / self.input_records as f64
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        summary.push_str(&format!("Input Records: {}\n", self.input_records));
        summary.push_str(&format!(
            "Clean Records: {} ({:.1}%)\n",
            self.clean_records,
            self.share(self.clean_records)
        ));
        summary.push_str(&format!(
            "Dropped (missing value): {} ({:.1}%)\n",
            self.missing_values,
            self.share(self.missing_values)
        ));
        if self.missing_pollutants > 0 {
            summary.push_str(&format!(
                "Dropped (missing pollutant): {}\n",
                self.missing_pollutants
            ));
        }
        summary.push_str(&format!(
            "Duplicates Removed: {}\n",
            self.duplicates_removed
        ));
        summary.push_str(&format!(
            "Invalid Timestamps: {} start, {} end\n",
            self.invalid_start_timestamps, self.invalid_end_timestamps
        ));
        summary.push_str(&format!(
            "Organizations Filled From Zone: {}\n",
            self.organizations_filled
        ));
        summary.push_str(&format!(
            "Records Without Department: {}\n",
            self.unmapped_departments
        ));

        match (self.corpus_mean, self.corpus_std) {
            (Some(mean), Some(std)) => summary.push_str(&format!(
                "Normalization: mean={:.3}, std={:.3}\n",
                mean, std
            )),
            _ => summary.push_str("Normalization: undefined (fewer than two distinct values)\n"),
        }

        match &self.cache {
            CacheOutcome::Disabled => summary.push_str("Cache: disabled\n"),
            CacheOutcome::Written(location) => {
                summary.push_str(&format!("Cache: written to {}\n", location))
            }
            CacheOutcome::Failed(reason) => {
                summary.push_str(&format!("Cache: not written ({})\n", reason))
            }
        }

        summary
    }
}
