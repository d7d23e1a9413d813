use crate::cli::args::RunArgs;
use crate::exit_codes::{EXIT_COMMAND_FAILED, EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use anyhow::{Context, Result};
use mlnsweep_core::{run_sweep, IterationStatus, SweepReport};
use std::path::Path;

pub fn run(args: RunArgs) -> Result<i32> {
    let file = args.sweep_file()?;

    if args.print_config {
        print!("{}", serde_yaml::to_string(&file)?);
        return Ok(EXIT_SUCCESS);
    }

    let config = file.resolve().context("failed to resolve sweep config")?;
    let range = match config.iterations() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return Ok(e.exit_code());
        }
    };

    println!("mlnsweep");
    println!("========");
    println!("Template:   {}", config.template.name());
    println!(
        "Evidence:   {} literal(s), iterations {}..={}",
        config.evidence.len(),
        range.start(),
        range.end()
    );
    println!("Solver:     {}", config.solver.display(Path::new("<input>")));
    println!("Logs:       {}", config.logs_dir.display());
    println!();

    let report = match run_sweep(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Sweep error: {}", e);
            return Ok(e.exit_code());
        }
    };

    print_table(&report);

    if let Some(path) = &args.report {
        crate::fs::write_report(path, &report)?;
        println!("Report saved to {}", path.display());
    }

    // The table and report above still cover the iterations that ran.
    if let Some(stopped) = report
        .iterations
        .iter()
        .find(|r| r.status == IterationStatus::Error)
    {
        eprintln!(
            "Sweep error: iteration {}: {}",
            stopped.index,
            stopped.message.as_deref().unwrap_or("unknown error")
        );
        return Ok(EXIT_CONFIG_ERROR);
    }

    if report.all_succeeded() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_COMMAND_FAILED)
    }
}

fn print_table(report: &SweepReport) {
    println!(
        "{:<6} {:<13} {:<6} {:<10} {:<30}",
        "ITER", "STATUS", "EXIT", "DUR(ms)", "LOG"
    );
    println!("{:-<6} {:-<13} {:-<6} {:-<10} {:-<30}", "", "", "", "", "");
    for res in &report.iterations {
        let exit = res
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<13} {:<6} {:<10} {:<30}",
            res.index,
            format!("{:?}", res.status),
            exit,
            res.duration_ms,
            res.log.display()
        );
    }
    println!();
    let s = &report.summary;
    println!(
        "SUMMARY: total={} succeeded={} failed={} timed_out={} launch_errors={} errors={}{}",
        s.total,
        s.succeeded,
        s.failed,
        s.timed_out,
        s.launch_errors,
        s.errors,
        if s.aborted { " (aborted)" } else { "" }
    );
}
