//! commune-probe - resolve one user's access to a commune from the command line

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use commune_access::{
    api::HttpCommuneApi,
    config::Args,
    gate::{GateContext, Guarded, Rendered},
    list::{load_lists, render_row, ListsView},
    logging::init_tracing,
    membership::MembershipCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(&args.log_level);

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Data API: {}", args.api_url);
    info!("Commune: {}", args.commune_id);

    let api = Arc::new(
        HttpCommuneApi::new(args.api_config()).context("Failed to build HTTP client")?,
    );
    let cache = Arc::new(MembershipCache::new(api.clone()));

    match args.session() {
        Some(session) => {
            info!(user_id = %session.user_id, "Probing with session");
            cache.init_session(session);
        }
        None => info!("Probing as guest"),
    }

    cache.ensure(&args.commune_id).await;
    if let Some(reason) = cache.failure(&args.commune_id) {
        bail!("Unable to verify access: {}", reason);
    }
    if let Some(entry) = cache.entry(&args.commune_id) {
        info!(
            generation = entry.generation,
            fetched_at = ?entry.fetched_at,
            "Membership resolved"
        );
    }
    println!("role: {}", cache.get_role(&args.commune_id));

    let routes = args.gate_routes();
    let route = args.target_route();
    let ctx = GateContext::for_route(&cache, &routes, &route);
    let page = Guarded::for_route(&route, |ctx: &GateContext<'_>| ctx.location.clone());
    match page.resolve(&ctx).await {
        Rendered::View(location) => println!("{}: allowed", location),
        Rendered::Redirect(redirect) => {
            println!("{}: redirect to {}", route.path(), redirect.to)
        }
        Rendered::Loading => println!("{}: still loading", route.path()),
        Rendered::Denied(denial) => println!("{}: denied ({:?})", route.path(), denial),
    }

    // Actions behind a role gate re-check membership before mutating
    if let Some(minimum) = route.required_role() {
        match cache.require(&args.commune_id, minimum).await {
            Ok(role) => println!("actions: permitted as {}", role),
            Err(e) if e.is_denial() => println!("actions: refused ({})", e),
            Err(e) => warn!(error = %e, "Action precondition could not be checked"),
        }
    }

    let session = cache.session();
    match load_lists(api.as_ref(), &args.commune_id, session.as_ref()).await {
        ListsView::Ready(lists) => {
            for list in lists {
                println!();
                println!("# {} ({})", list.meta.title, list.meta.post_id);
                let header: Vec<&str> = list
                    .columns
                    .iter()
                    .map(|c| c.attribute_name.as_str())
                    .collect();
                println!("{}", header.join(" | "));
                for row in &list.rows {
                    let cells: Vec<String> = render_row(&list.columns, row)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    println!("{}", cells.join(" | "));
                }
            }
        }
        ListsView::Failed(message) => bail!(message),
        ListsView::Loading => {}
    }

    Ok(())
}
