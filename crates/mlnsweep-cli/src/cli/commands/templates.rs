use crate::cli::args::TemplatesArgs;
use crate::exit_codes::EXIT_SUCCESS;
use anyhow::Result;
use mlnsweep_core::{Template, TemplateVariant};

pub fn run(args: TemplatesArgs) -> Result<i32> {
    if let Some(name) = args.name {
        let variant = TemplateVariant::from_name(&name)?;
        print!("{}", variant.text());
        return Ok(EXIT_SUCCESS);
    }

    println!("{:<18} PREDICATES", "NAME");
    for v in TemplateVariant::all() {
        let preds = Template::builtin(*v)
            .declared_predicates()
            .iter()
            .map(|p| format!("{}/{}", p.name, p.arity()))
            .collect::<Vec<_>>()
            .join(" ");
        let marker = if *v == TemplateVariant::default() {
            " (default)"
        } else {
            ""
        };
        println!("{:<18} {}{}", v.name(), preds, marker);
    }
    Ok(EXIT_SUCCESS)
}
