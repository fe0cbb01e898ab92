use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = grover_api::Args::parse();

	grover_api::run(args).await
}
