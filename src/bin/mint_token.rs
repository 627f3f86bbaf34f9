//! Issues a bearer token for local testing against a running server.

use clap::Parser;
use dotenvy::dotenv;
use tubely::config::AppConfig;
use tubely::utils::auth::create_jwt;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mint a bearer token signed with JWT_SECRET")]
struct Args {
    /// User ID placed in the token subject
    user_id: String,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 1)]
    hours: i64,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    let config = AppConfig::from_env();

    let token = create_jwt(
        &args.user_id,
        &config.jwt_secret,
        chrono::Duration::hours(args.hours),
    )?;
    println!("{}", token);
    Ok(())
}
