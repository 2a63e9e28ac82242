use clap::Parser;
use form_pilot::cli::commands::{cmd_answer, cmd_autofill, cmd_extract, cmd_fill};
use form_pilot::cli::config::{API_KEY_ENV, Cli, Commands, load_config, resolve_generator, resolve_trace_path};
use form_pilot::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let tracer = match resolve_trace_path(&cli, &config) {
        Some(path) => TraceLogger::new(&path),
        None => TraceLogger::disabled(),
    };

    // Resolve generator settings: CLI > config > env > defaults
    let env_key = std::env::var(API_KEY_ENV).ok();

    match &cli.command {
        Commands::Extract { html, url } => {
            cmd_extract(html.as_deref(), url.as_deref(), cli.verbose, &tracer)?;
        }
        Commands::Answer {
            html,
            url,
            generator,
        } => {
            let settings = resolve_generator(&cli, generator.as_deref(), &config, env_key);
            cmd_answer(html.as_deref(), url.as_deref(), &settings, cli.verbose, &tracer)?;
        }
        Commands::Fill {
            html,
            answers,
            live,
        } => {
            cmd_fill(html, answers, &config.replay, *live, cli.verbose, &tracer)?;
        }
        Commands::Autofill {
            html,
            url,
            generator,
            live,
        } => {
            let settings = resolve_generator(&cli, generator.as_deref(), &config, env_key);
            cmd_autofill(
                html.as_deref(),
                url.as_deref(),
                &settings,
                &config.replay,
                *live,
                cli.verbose,
                tracer,
            )?;
        }
    }

    Ok(())
}
