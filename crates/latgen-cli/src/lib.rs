//! CLI logic for the latgen lattice generator.
//!
//! Reads a device hierarchy, generates its lattice and writes the XML
//! document.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use error_adapter::ErrorAdapter;

use std::fs;

use log::{info, warn};

use latgen::{Generator, LatgenError};

use error_adapter::DiagnosticAdapter;

/// Run the latgen CLI application
///
/// # Errors
///
/// Returns `LatgenError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid device hierarchies
/// - Lattice construction errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), LatgenError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing device hierarchy"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let generator = Generator::new(app_config);
    let hierarchy = generator.load(&source)?;
    let generated = generator.build(&hierarchy)?;

    for diagnostic in generated.diagnostics() {
        warn!("{}", error_adapter::render(&DiagnosticAdapter::new(diagnostic)));
    }

    let xml = generator.render_xml(generated.lattice(), &hierarchy)?;
    fs::write(&args.output, xml)?;

    info!(
        output_file = args.output,
        elements = generated.lattice().len();
        "Lattice exported successfully"
    );

    Ok(())
}
