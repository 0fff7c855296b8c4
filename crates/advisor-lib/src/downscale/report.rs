//! Plain text rendering of recommendations

use std::fmt;

use super::{Recommendation, Recommendations};
use crate::units::bytes_size;

fn bytes(value: u64) -> String {
    bytes_size(value as f64)
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let current = &self.current;
        writeln!(f, "Tier: {}", self.tier)?;
        writeln!(
            f,
            "Current Config: {} nodes with {} disk ({} memory) each = {} total",
            current.nodes,
            bytes(current.disk_per_node),
            bytes(current.memory_per_node),
            bytes(current.disk_total)
        )?;
        writeln!(f, "Current Consumption: {}", bytes(current.consumption))?;

        if self.is_already_smallest {
            return write!(f, "Already on smallest size of the tier, no downsizing possible.");
        }

        let smaller = &self.smaller;
        writeln!(
            f,
            "Next smaller: {} nodes with {} disk ({} memory) each = {} total",
            smaller.nodes,
            bytes(smaller.disk_per_node),
            bytes(smaller.memory_per_node),
            bytes(smaller.disk_total)
        )?;

        let (free, free_pct) = if smaller.free_after_downsize > 0.0 {
            (
                bytes_size(smaller.free_after_downsize),
                format!("{:.1}%", smaller.free_after_downsize_pct),
            )
        } else {
            ("does not fit".to_string(), "- %".to_string())
        };
        writeln!(f, "Free space after downsize: {free} ({free_pct})")?;
        writeln!(f, "Downsize of tier recommended: {}", self.is_downscaling_recommended)
    }
}

impl fmt::Display for Recommendations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for recommendation in self.iter() {
            writeln!(f, "{recommendation}")?;
        }
        Ok(())
    }
}
