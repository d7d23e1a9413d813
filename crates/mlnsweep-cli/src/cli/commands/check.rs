use crate::cli::args::CheckArgs;
use crate::exit_codes::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use anyhow::Result;
use mlnsweep_core::check_evidence;

pub fn run(args: CheckArgs) -> Result<i32> {
    let file = args.source.load()?;
    let template = file.load_template()?;
    let evidence = file.load_evidence()?;

    let problems = check_evidence(&template, &evidence);
    if problems.is_empty() {
        println!(
            "OK: {} literal(s) fit template '{}'",
            evidence.len(),
            template.name()
        );
        return Ok(EXIT_SUCCESS);
    }

    for p in &problems {
        println!("{}", p);
    }
    eprintln!(
        "{} problem(s) in evidence for template '{}'",
        problems.len(),
        template.name()
    );
    Ok(EXIT_CONFIG_ERROR)
}
