use clap::{Args, Parser as ClapParser, Subcommand};
use pycraft::{
    FormatterChoice, SessionOptions,
    cli::{self, CliError, EditCommand, EditOptions},
    output::to_source,
};
use std::{
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "pycraft")]
#[command(about = "pycraft - Edit dict, list and set bindings in Python source files")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Target {
    /// Python file to edit
    file: PathBuf,

    /// Name of the top-level binding
    name: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Write the rendered source without formatting it
    #[arg(long)]
    no_format: bool,

    /// External formatter reading stdin and writing stdout, e.g. "black -q -"
    #[arg(long, value_name = "COMMAND")]
    formatter_cmd: Option<String>,

    /// Print the result instead of writing the file
    #[arg(long)]
    dry_run: bool,
}

impl OutputArgs {
    fn session_options(&self) -> SessionOptions {
        let formatter = match &self.formatter_cmd {
            Some(command) => {
                FormatterChoice::Command(command.split_whitespace().map(str::to_string).collect())
            }
            None => FormatterChoice::Builtin,
        };
        SessionOptions {
            format: !self.no_format,
            formatter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the top-level bindings of a file
    List {
        /// Python file to inspect
        file: PathBuf,
    },

    /// Show the value of a binding (JSON when it is a plain literal)
    Show {
        /// Python file to inspect
        file: PathBuf,
        /// Name of the top-level binding
        name: String,
    },

    /// Set a key of a dict: d[key] = value
    DictSet {
        #[command(flatten)]
        target: Target,
        /// Key (JSON, or plain text for a string)
        #[arg(allow_hyphen_values = true)]
        key: String,
        /// Value (JSON, or plain text for a string; read from stdin if omitted)
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Remove a key from a dict
    DictPop {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        key: String,
    },

    /// Remove all entries of a dict
    DictClear {
        #[command(flatten)]
        target: Target,
    },

    /// Append a value to a list
    ListAppend {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Append each value of a JSON array to a list
    ListExtend {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        values: Option<String>,
    },

    /// Insert a value before an index
    ListInsert {
        #[command(flatten)]
        target: Target,
        #[arg(allow_negative_numbers = true)]
        index: isize,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Remove the first element equal to a value
    ListRemove {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Remove the element at an index (default: the last one)
    ListPop {
        #[command(flatten)]
        target: Target,
        #[arg(allow_negative_numbers = true, default_value_t = -1)]
        index: isize,
    },

    /// Remove all elements of a list
    ListClear {
        #[command(flatten)]
        target: Target,
    },

    /// Reverse a list in place
    ListReverse {
        #[command(flatten)]
        target: Target,
    },

    /// Add a value to a set
    SetAdd {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Remove a value from a set, failing if it is missing
    SetRemove {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Remove a value from a set if present
    SetDiscard {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Add each value of a JSON array to a set
    SetUpdate {
        #[command(flatten)]
        target: Target,
        #[arg(allow_hyphen_values = true)]
        values: Option<String>,
    },

    /// Format a file without editing it
    Format {
        /// Python file to format
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::List { file } => run_list(file),
        Commands::Show { file, name } => run_show(file, name),
        Commands::Format { file, output } => run_format(file, output),
        Commands::DictSet { target, key, value } => read_value(value).and_then(|value| {
            let key = cli::parse_value(&key);
            run_edit(target, EditCommand::DictSet { key, value })
        }),
        Commands::DictPop { target, key } => {
            let key = cli::parse_value(&key);
            run_edit(target, EditCommand::DictPop { key })
        }
        Commands::DictClear { target } => run_edit(target, EditCommand::DictClear),
        Commands::ListAppend { target, value } => {
            read_value(value).and_then(|v| run_edit(target, EditCommand::ListAppend(v)))
        }
        Commands::ListExtend { target, values } => {
            read_values(values).and_then(|v| run_edit(target, EditCommand::ListExtend(v)))
        }
        Commands::ListInsert {
            target,
            index,
            value,
        } => read_value(value)
            .and_then(|value| run_edit(target, EditCommand::ListInsert { index, value })),
        Commands::ListRemove { target, value } => {
            read_value(value).and_then(|v| run_edit(target, EditCommand::ListRemove(v)))
        }
        Commands::ListPop { target, index } => run_edit(target, EditCommand::ListPop(index)),
        Commands::ListClear { target } => run_edit(target, EditCommand::ListClear),
        Commands::ListReverse { target } => run_edit(target, EditCommand::ListReverse),
        Commands::SetAdd { target, value } => {
            read_value(value).and_then(|v| run_edit(target, EditCommand::SetAdd(v)))
        }
        Commands::SetRemove { target, value } => {
            read_value(value).and_then(|v| run_edit(target, EditCommand::SetRemove(v)))
        }
        Commands::SetDiscard { target, value } => {
            read_value(value).and_then(|v| run_edit(target, EditCommand::SetDiscard(v)))
        }
        Commands::SetUpdate { target, values } => {
            read_values(values).and_then(|v| run_edit(target, EditCommand::SetUpdate(v)))
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// The value argument, or stdin when it is omitted and piped.
fn read_argument(argument: Option<String>) -> Result<String, CliError> {
    match argument {
        Some(s) => Ok(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer.trim_end_matches(['\n', '\r']).to_string())
        }
        None => Err(CliError::NoValue),
    }
}

fn read_value(argument: Option<String>) -> Result<pycraft::Value, CliError> {
    read_argument(argument).map(|text| cli::parse_value(&text))
}

fn read_values(argument: Option<String>) -> Result<Vec<pycraft::Value>, CliError> {
    let text = read_argument(argument)?;
    Ok(cli::parse_values(&text)?)
}

fn run_edit(target: Target, command: EditCommand) -> Result<(), CliError> {
    let options = EditOptions {
        session: target.output.session_options(),
        dry_run: target.output.dry_run,
        path: target.file,
        name: target.name,
        command,
    };

    let result = cli::execute_edit(&options)?;
    if let Some(removed) = result.removed {
        println!("{}", to_source(&removed));
    }
    if let Some(preview) = result.preview {
        print!("{}", preview);
    }
    Ok(())
}

fn run_format(file: PathBuf, output: OutputArgs) -> Result<(), CliError> {
    if let Some(formatted) = cli::execute_format(&file, output.session_options(), output.dry_run)? {
        print!("{}", formatted);
    }
    Ok(())
}

fn run_list(file: PathBuf) -> Result<(), CliError> {
    for binding in cli::execute_list(&file)? {
        let kind = binding
            .kind
            .zip(binding.representation)
            .map(|(kind, representation)| format!("{} ({})", kind, representation))
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{}", binding.line, binding.name, kind);
    }
    Ok(())
}

fn run_show(file: PathBuf, name: String) -> Result<(), CliError> {
    let Some(shown) = cli::execute_show(&file, &name)? else {
        eprintln!("No binding named '{}'", name);
        std::process::exit(1);
    };

    match shown.json {
        Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        None => println!("{}", shown.source),
    }
    Ok(())
}
