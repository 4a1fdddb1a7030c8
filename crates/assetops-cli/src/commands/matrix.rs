//! Support table printing

use colored::*;

use assetops_orchestrator::{entries_for, support_matrix};
use assetops_types::OperationKind;

use crate::display;

/// Print which operations every asset variant supports
pub fn print_matrix(selectors: bool) {
    display::section("Supported operations");

    for (asset_type, operations) in support_matrix() {
        println!();
        println!(
            "  {} {}",
            asset_type.to_string().bright_white().bold(),
            format!("({} operations)", operations.len()).bright_black()
        );

        for kind in OperationKind::ALL {
            let supported = operations.contains(&kind);
            let marker = if supported { "✓".bright_green() } else { "·".bright_black() };
            let padded = format!("{:<20}", kind.as_str());
            let name = if supported {
                padded.normal()
            } else {
                padded.bright_black()
            };

            println!("    {} {}", marker, name);
            if selectors {
                for entry in entries_for(asset_type, kind) {
                    println!(
                        "        {} {}",
                        format!("{:<16}", entry.leg.as_str()).bright_black(),
                        entry.selector.to_string().bright_cyan()
                    );
                }
            }
        }
    }
}
