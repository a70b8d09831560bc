/// The metric a chart plots for a test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Measure {
    /// Transactions per second, used for signature and HMAC algorithms.
    Tps,
    /// Bytes per second, used for every other algorithm.
    Throughput,
}

impl Measure {
    /// Column-name stem (`"tps"` or `"throughput"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Tps => "tps",
            Self::Throughput => "throughput",
        }
    }

    /// Unit shown on the measure axis.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Tps => "TPS",
            Self::Throughput => "Bytes/s",
        }
    }

    /// Columns read for this measure.
    pub fn keys(self) -> MeasureKeys {
        let (global_value, global_error) = match self {
            Self::Tps => ("tps global value", "tps global error"),
            Self::Throughput => ("throughput global value", "throughput global error"),
        };
        MeasureKeys {
            global_value,
            global_error,
        }
    }
}

/// Column keys associated with a [`Measure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasureKeys {
    /// Global measure value column.
    pub global_value: &'static str,
    /// Error bound of the global measure.
    pub global_error: &'static str,
}

/// A resolved measure with its column keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MeasureSelection {
    /// Selected measure.
    pub measure: Measure,
    /// Columns to read for it.
    pub keys: MeasureKeys,
}

impl MeasureSelection {
    /// Unit label for the measure axis.
    pub fn unit(&self) -> &'static str {
        self.measure.unit()
    }
}

/// Pick the measure for a test case.
///
/// Signature and HMAC algorithms are judged on transactions per second; everything else on
/// throughput. Matching is a case-insensitive substring test.
pub fn select_measure(test_case: &str) -> MeasureSelection {
    let lower = test_case.to_lowercase();
    let measure = if lower.contains("signature") || lower.contains("hmac") {
        Measure::Tps
    } else {
        Measure::Throughput
    };
    MeasureSelection {
        measure,
        keys: measure.keys(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/measure/select.rs"]
mod tests;
