use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use stagehand::formats::project::load_project;
use stagehand::node::kinds::{register_builtin, Services};
use stagehand::registry::Registry;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[arg(help = "Path to the project file")]
	project_path: PathBuf,
	#[arg(long, help = "Directory textures are looked up in, defaults to the project's")]
	textures: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	tracing_subscriber::registry()
		.with(fmt::layer())
		.with(LevelFilter::INFO)
		.init();

	let texture_dir = (cli.textures.clone())
		.or_else(|| cli.project_path.parent().map(PathBuf::from))
		.unwrap_or_default();
	let services = Services::new(texture_dir);
	let mut registry = Registry::new();
	register_builtin(&mut registry, &services);
	info!("Registered {} node classes", registry.class_names().count());

	let tree = load_project(&registry, &cli.project_path)?;

	println!("== Nodes ==\n{tree}");
	let draw_list = tree.draw_list(None, None);
	println!("== Draw order ==");
	for item in &draw_list {
		let node = tree.get(item.uuid).ok_or("draw list out of sync")?;
		println!("{:>4} {} {:?} {}x{}", item.z_order, item.uuid, node.name, item.size.x, item.size.y);
	}
	Ok(())
}
