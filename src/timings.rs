// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Published results.

use crate::shader::ShaderNames;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// GPU milliseconds per shader combination for the most recently resolved frame.
pub type ShaderTimes = HashMap<ShaderNames, f64>;

/// One row of [ShaderTimes], as handed to hosts.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderTiming {
    pub names: ShaderNames,
    pub time_ms: f64,
}

impl Display for ShaderTiming {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Shader({}) took {}ms this frame", self.names, self.time_ms)
    }
}

/// Flattens `times` with the most expensive combination first.
pub fn sorted_by_time(times: &ShaderTimes) -> Vec<ShaderTiming> {
    let mut rows: Vec<ShaderTiming> = times
        .iter()
        .map(|(names, time_ms)| ShaderTiming {
            names: names.clone(),
            time_ms: *time_ms,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.time_ms
            .total_cmp(&a.time_ms)
            .then_with(|| a.names.cmp(&b.names))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(vertex: &str) -> ShaderNames {
        ShaderNames {
            vertex: Some(vertex.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn most_expensive_first() {
        let mut times = ShaderTimes::new();
        times.insert(names("cheap"), 0.25);
        times.insert(names("costly"), 4.0);
        times.insert(names("middle"), 1.0);
        let sorted = sorted_by_time(&times);
        let order: Vec<_> = sorted.iter().map(|t| t.names.vertex.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["costly", "middle", "cheap"]);
        assert_eq!(
            sorted[0].to_string(),
            "Shader(vertex=costly) took 4ms this frame"
        );
    }
}
