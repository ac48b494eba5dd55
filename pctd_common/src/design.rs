//! Lexical scanning of Verilog design sources.
//!
//! This is not a Verilog parser. It harvests module names, declaration
//! counts and, most importantly, the names assigned inside clocked
//! `always @(posedge ...)` / `always @(negedge ...)` blocks. Those names are
//! the register hints consumed by the classifier.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::HintSet;

lazy_static! {
    static ref MODULE_RE: Regex = Regex::new(r"\bmodule\s+(\w+)").unwrap();
    static ref DECLARATION_RE: Regex =
        Regex::new(r"(?:reg|wire)\s+(?:\[.*?\])?\s*(\w+)").unwrap();
    static ref ALWAYS_RE: Regex = Regex::new(r"always\s*@\s*\(([^)]+)\)").unwrap();
    static ref CLOCKED_BLOCK_RE: Regex = Regex::new(
        r"always\s*@\s*\((?:posedge|negedge)[^)]*\)[\s\S]*?begin[\s\S]*?end"
    )
    .unwrap();
    // `<=` first so non-blocking assignments bind to the left-hand name.
    static ref ASSIGN_RE: Regex = Regex::new(r"(\w+)\s*<=|(\w+)\s*=").unwrap();
}

/// Errors raised while reading a design source.
#[derive(Debug, Error)]
pub enum DesignError {
    /// The design file could not be read.
    #[error("Failed to read design {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// What the scanner found in a design source.
#[derive(Debug, Clone, Default)]
pub struct DesignSummary {
    /// Module names in declaration order.
    pub modules: Vec<String>,
    /// Number of `reg`/`wire` declarations.
    pub declarations: usize,
    /// Number of `always @(...)` blocks of any sensitivity.
    pub always_blocks: usize,
    /// Names assigned inside clocked blocks.
    pub register_hints: HintSet,
}

/// Scan Verilog source text.
#[must_use]
pub fn scan_design(source: &str) -> DesignSummary {
    let modules = MODULE_RE
        .captures_iter(source)
        .map(|caps| caps[1].to_string())
        .collect::<Vec<_>>();
    let declarations = DECLARATION_RE.captures_iter(source).count();
    let always_blocks = ALWAYS_RE.captures_iter(source).count();

    let mut register_hints = HintSet::new();
    for block in CLOCKED_BLOCK_RE.find_iter(source) {
        for caps in ASSIGN_RE.captures_iter(block.as_str()) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
                register_hints.insert(name.as_str());
            }
        }
    }

    tracing::debug!(
        "Scanned design: {} modules, {} declarations, {} always blocks, {} register hints",
        modules.len(),
        declarations,
        always_blocks,
        register_hints.len()
    );

    DesignSummary {
        modules,
        declarations,
        always_blocks,
        register_hints,
    }
}

/// Read and scan a design file. Invalid UTF-8 is replaced rather than rejected.
pub fn scan_design_file<P: AsRef<Path>>(path: P) -> Result<DesignSummary, DesignError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DesignError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let summary = scan_design(&String::from_utf8_lossy(&bytes));
    tracing::info!(
        "Found {} modules in {}: {}",
        summary.modules.len(),
        path.display(),
        summary.modules.join(", ")
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UART_TX: &str = r"
module uart_tx (input clk, input rst, output reg tx);
    reg [3:0] bit_cnt;
    reg tx_busy;
    wire start;
    always @(posedge clk) begin
        if (rst) begin
            bit_cnt <= 4'd0;
            tx_busy <= 1'b0;
        end
    end
    always @(*) begin
        tx = tx_busy;
    end
endmodule
";

    #[test]
    fn test_counts_structure() {
        let summary = scan_design(UART_TX);
        assert_eq!(summary.modules, vec!["uart_tx".to_string()]);
        assert_eq!(summary.always_blocks, 2);
        // output reg tx, bit_cnt, tx_busy, start
        assert_eq!(summary.declarations, 4);
    }

    #[test]
    fn test_clocked_block_assignments_become_hints() {
        let summary = scan_design(UART_TX);
        let hints = summary.register_hints.iter().collect::<Vec<_>>();
        // The lazy block match stops at the first `end`, which closes the
        // inner `if`. Both assignments sit before it.
        assert_eq!(hints, vec!["bit_cnt", "tx_busy"]);
    }

    #[test]
    fn test_combinational_block_contributes_nothing() {
        let summary = scan_design("always @(*) begin y = a & b; end");
        assert!(summary.register_hints.is_empty());
        assert_eq!(summary.always_blocks, 1);
    }
}
