mod cli;
use cli::cli;

use std::path::PathBuf;

use concurrent::{Error, Options, compile_source};

type AppResult<T> = Result<T, Error>;

fn main() -> AppResult<()> {
    env_logger::init();
    let cmd = cli();

    match cmd.subcommand() {
        Some(("compile", args)) => compile_cmd(args),
        _ => Err(Error::InvalidParams("expected a subcommand (try `compile`)".to_string())),
    }
}

fn compile_cmd(args: &clap::ArgMatches) -> AppResult<()> {
    let input = if let Some(inline) = args.get_one::<String>("input") {
        inline.clone()
    } else if let Some(file_path) = args.get_one::<PathBuf>("file") {
        std::fs::read_to_string(file_path).map_err(|e| Error::Io(format!("failed to read {}: {e}", file_path.display())))?
    } else {
        return Err(Error::InvalidParams("one of --input/--file is required".to_string()));
    };

    let seed = *args.get_one::<u64>("seed").unwrap_or(&0);
    let debug_graph_path = args.get_one::<PathBuf>("debug-graph");
    let options = Options { seed, render_debug_graphs: debug_graph_path.is_some(), ..Options::default() };

    let compilation = compile_source(&input, &options)?;

    let rendered = compilation.program.to_string();
    match args.get_one::<PathBuf>("output") {
        Some(path) => std::fs::write(path, rendered).map_err(|e| Error::Io(format!("failed to write {}: {e}", path.display())))?,
        None => println!("{rendered}"),
    }

    if let (Some(path), Some(dot)) = (debug_graph_path, compilation.debug_graphs) {
        std::fs::write(path, dot).map_err(|e| Error::Io(format!("failed to write {}: {e}", path.display())))?;
    }

    Ok(())
}
