use crate::cli::args::RenderArgs;
use crate::exit_codes::EXIT_SUCCESS;
use anyhow::Result;
use mlnsweep_core::render_input;
use mlnsweep_core::runner::iteration_range;

pub fn run(args: RenderArgs) -> Result<i32> {
    let file = args.source.load()?;
    let template = file.load_template()?;
    let evidence = file.load_evidence()?;

    let i = args.iteration;
    if let Err(e) = iteration_range(evidence.len(), Some(i), Some(i)) {
        eprintln!("Config error: {}", e);
        return Ok(e.exit_code());
    }

    print!("{}", render_input(&template, evidence.prefix(i)));
    Ok(EXIT_SUCCESS)
}
