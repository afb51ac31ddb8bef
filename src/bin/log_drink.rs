use std::env;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};
use uuid::Uuid;

use sss_ryder::actions;
use sss_ryder::models::DrinkType;
use sss_ryder::store::{SupabaseStore, TournamentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args: Vec<String> = env::args().skip(1).collect();
    let (player_id, raw_type, count) = match args.as_slice() {
        [player, drink] => (player.parse::<Uuid>()?, drink.as_str(), 1),
        [player, drink, count] => (
            player.parse::<Uuid>()?,
            drink.as_str(),
            count.parse::<i32>()?,
        ),
        _ => bail!("uso: log-drink <player-id> <cerveza|chupito|copa|hidalgo> [cantidad]"),
    };

    let drink_type = DrinkType::parse(raw_type);
    if drink_type == DrinkType::Unknown {
        warn!("Unknown drink type '{}', scoring at the fallback rate", raw_type);
    }

    let store =
        Arc::new(SupabaseStore::from_env().context("configuring the Supabase client")?);
    let drinker = store
        .fetch_profile(player_id)
        .await?
        .context("jugador no encontrado")?;

    match actions::log_drink(store.as_ref(), &drinker, drink_type, count, Utc::now()).await {
        Ok(()) => {
            info!(
                "Registered {} x{} for {}",
                drink_type.label(),
                count,
                drinker.short_name()
            );
            println!(
                "{} {} x{} para {}",
                drink_type.emoji(),
                drink_type.label(),
                count,
                drinker.short_name()
            );
            Ok(())
        }
        Err(e) => {
            error!("Could not register the drink: {}", e);
            Err(e.into())
        }
    }
}
