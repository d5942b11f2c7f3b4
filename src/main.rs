use clap::Parser;

use tira_textnorm::app;
use tira_textnorm::cli::{Cli, Command};
use tira_textnorm::logging;
use tira_textnorm::TextnormResult;

fn main() {
    logging::init();
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        tracing::error!(code = error.error_code(), "{error}");
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn run(cli: Cli) -> TextnormResult<()> {
    match cli.command {
        Command::Run(args) => {
            let settings = args.to_settings()?;
            let outcome = app::run(&settings)?;
            println!("{}", outcome.log);
            println!(
                "wrote {} rows to {}",
                outcome.rows,
                outcome.out_dir.join(app::TRANSCRIPTIONS_FILE).display()
            );
        }
        Command::ScaffoldReplacements(args) => {
            let paths = args.corpus.env_paths();
            let output = args.replacements_path(&paths)?;
            let options = args.corpus.pipeline_options(2)?;
            let chars = app::scaffold_replacements(
                &args.corpus.input_path(&paths),
                &args.corpus.tier,
                &options,
                &args.corpus.classifier_settings(),
                &output,
            )?;
            println!("{chars} distinct characters written to {}", output.display());
        }
    }
    Ok(())
}
