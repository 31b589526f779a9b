use anyhow::Result;
use mapforge::config::Config;
use termimad::MadSkin;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_help_flag = true, disable_version_flag = true)]
pub struct Subcommand {
	#[command(subcommand)]
	topic: Topic,

	/// Print the raw markdown instead of formatting it for the terminal.
	#[arg(long)]
	raw: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Topic {
	/// Documented example of the YAML configuration file
	Config,
}

pub fn run(command: &Subcommand) -> Result<()> {
	let markdown = match command.topic {
		Topic::Config => config_docs(),
	};

	if command.raw {
		println!("{markdown}");
	} else {
		println!("{}", MadSkin::default().term_text(&markdown));
	}
	Ok(())
}

fn config_docs() -> String {
	format!(
		"# MapForge Configuration\n\n\
		The server and the `export` command read an optional YAML file passed with `-c`. \
		Every section is optional, missing values fall back to their defaults. \
		Relative paths are resolved against the folder of the config file.\n\n\
		```yaml\n{}\n```\n",
		Config::demo_yaml().trim_end()
	)
}
