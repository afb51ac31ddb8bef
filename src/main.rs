use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use uuid::Uuid;

use sss_ryder::leaderboard::{challenge_leaderboard, drink_leaderboard};
use sss_ryder::models::Profile;
use sss_ryder::realtime::ChangeHub;
use sss_ryder::score_service::{fetch_overview, ScoreService};
use sss_ryder::scoring::TeamScoreBreakdown;
use sss_ryder::store::{SupabaseStore, TournamentStore};

fn name_of(profiles: &[Profile], id: Uuid) -> &str {
    profiles
        .iter()
        .find(|p| p.id == id)
        .map(|p| p.short_name())
        .unwrap_or("Desconocido")
}

fn print_team(line: &TeamScoreBreakdown) {
    println!(
        "  {:<12} {:>6.2}  (golf {:.1}, bebidas {:.2}, retos {:.1}, hidalgos {:.1})",
        line.team_name,
        line.total,
        line.golf,
        line.drinks,
        line.challenges,
        -line.hidalgo_penalty
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let store = Arc::new(SupabaseStore::from_env().context("configuring the Supabase client")?);
    let store: Arc<dyn TournamentStore> = store;

    info!("Fetching tournament overview");
    let overview = fetch_overview(store.as_ref()).await?;

    let service = ScoreService::new(store.clone(), ChangeHub::new());
    let scores = service.refresh().await.context("computing the standings")?;

    println!();
    println!(
        "{} ({})",
        overview.tournament.name,
        overview.tournament.location.as_deref().unwrap_or("sin sede")
    );
    println!();
    print_team(&scores.pimentonas);
    print_team(&scores.tabaqueras);
    match scores.leader() {
        Some(leader) => println!("  Va ganando: {}", leader.team_name),
        None => println!("  Empate total"),
    }

    println!();
    println!("Rondas:");
    for round in &overview.rounds {
        println!(
            "  {}. {} ({})",
            round.round_order,
            round.name,
            round.format.label()
        );
    }

    let (drinks, assignments, challenges) = futures::try_join!(
        store.fetch_drinks(),
        store.fetch_assignments(),
        store.fetch_challenges(),
    )?;

    println!();
    println!("Ranking de bebidas:");
    for (position, standing) in drink_leaderboard(&drinks).iter().take(5).enumerate() {
        let breakdown: Vec<String> = standing
            .breakdown
            .iter()
            .map(|(drink_type, count)| format!("{}{}", drink_type.emoji(), count))
            .collect();
        println!(
            "  {}. {:<12} {:>3}  {}",
            position + 1,
            name_of(&overview.profiles, standing.user_id),
            standing.total,
            breakdown.join(" ")
        );
    }

    println!();
    println!("Ranking de retos:");
    for (position, standing) in challenge_leaderboard(&assignments, &challenges)
        .iter()
        .take(5)
        .enumerate()
    {
        println!(
            "  {}. {:<12} {} retos, {:.1} pts",
            position + 1,
            name_of(&overview.profiles, standing.user_id),
            standing.completed,
            standing.points
        );
    }

    println!();
    println!("Últimos eventos:");
    for event in store.fetch_events(10).await? {
        let actor = event
            .actor_user_id
            .map(|id| name_of(&overview.profiles, id).to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{}] {}: {}",
            event.created_at.with_timezone(&Local).format("%a %H:%M"),
            event.event_type.label(),
            actor
        );
    }
    println!();

    Ok(())
}
