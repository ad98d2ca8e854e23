use std::path::PathBuf;

use clap::{ArgGroup, ArgMatches, arg, command, value_parser};

pub(crate) fn cli() -> ArgMatches {
    command!()
        .subcommand(
            command!("compile")
                .about("Compile a source program into event-loop-driven functions")
                .arg(arg!(-i --input <INPUT> "Raw input (inline)"))
                .arg(
                    arg!(-f --file <INPUT> "Source file to process")
                        .value_parser(value_parser!(PathBuf)),
                )
                .group(
                    ArgGroup::new("input-source")
                        .args(["input", "file"])
                        .required(true)
                        .multiple(false),
                )
                .arg(
                    arg!(-o --output <OUTPUT> "Write the rendered program here instead of stdout")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-s --seed <SEED> "Seed for the identifier mint")
                        .value_parser(value_parser!(u64))
                        .default_value("0"),
                )
                .arg(arg!(--"debug-graph" <PATH> "Also dump the post-pipeline graph set as Graphviz dot text").value_parser(value_parser!(PathBuf))),
        )
        .get_matches()
}
