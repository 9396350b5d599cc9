pub mod cli;
pub mod codegen;
pub mod error;
pub mod select;
pub mod spec;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}
