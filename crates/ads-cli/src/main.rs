// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `ads-supply`: run a supply agent against a live adserver, headless.

use ads_app_core::config::ConfigService;
use ads_app_core::prefs::{
    publisher_from_wallet, AgentPrefs, Chain, UiRearm, UiRefresh, AGENT_PREFS_KEY,
};
use ads_config_fs::FsConfigStore;
use ads_proto::UiPosition;
use ads_scene_port::{
    AspectRatio, Billboard, PlacementParams, PlainPlacement, Registration, StandOptions, Totem,
};
use ads_supply_agent::{drive, HttpFetcher, SupplyAgent};
use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod local;

use local::{LocalHost, LogSurface};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless ad supply agent")]
struct Args {
    /// Adserver base URL (overrides stored prefs)
    #[arg(long)]
    adserver: Option<String>,
    /// Publisher id, e.g. ads:0001-000000F1-6451
    #[arg(long, conflicts_with = "wallet")]
    publisher: Option<String>,
    /// Payout wallet address; the publisher id is derived from it
    #[arg(long)]
    wallet: Option<String>,
    /// Chain of --wallet
    #[arg(long, default_value = "ads")]
    chain: Chain,
    /// Scene base parcel as "x,y"
    #[arg(long, default_value = "0,0", allow_hyphen_values = true)]
    parcel: String,
    /// Local user id (wallet address)
    #[arg(long)]
    user: Option<String>,
    /// Treat the local user as standing in the scene
    #[arg(long)]
    present: bool,
    /// Square plain placement (repeatable)
    #[arg(long = "placement")]
    placements: Vec<String>,
    /// Totem stand (repeatable)
    #[arg(long = "totem")]
    totems: Vec<String>,
    /// 16:9 billboard stand (repeatable)
    #[arg(long = "billboard")]
    billboards: Vec<String>,
    /// Overlay position: top, bottom, left, right or center (repeatable)
    #[arg(long = "ui")]
    ui_positions: Vec<UiPosition>,
    /// Refresh each overlay after its own refresh time
    #[arg(long)]
    ui_refresh: bool,
    /// Clear overlays when the user leaves and show them again on return
    #[arg(long)]
    rearm: bool,
    /// Retry a failed scheduled refresh after this many milliseconds
    #[arg(long)]
    failure_backoff_ms: Option<u64>,
}

impl Args {
    fn apply(&self, prefs: &mut AgentPrefs) {
        if let Some(adserver) = &self.adserver {
            prefs.adserver.clone_from(adserver);
        }
        if let Some(publisher) = &self.publisher {
            prefs.publisher.clone_from(publisher);
        }
        if let Some(wallet) = &self.wallet {
            prefs.publisher = publisher_from_wallet(self.chain, wallet);
        }
        if !self.ui_positions.is_empty() {
            prefs.ui_positions.clone_from(&self.ui_positions);
        }
        if self.ui_refresh {
            prefs.ui_refresh = UiRefresh::PerPlacement;
        }
        if self.rearm {
            prefs.ui_rearm = UiRearm::OnReentry;
        }
        if let Some(ms) = self.failure_backoff_ms {
            prefs.failure_backoff_ms = Some(ms);
        }
    }

    fn registrations(&self) -> Vec<Registration> {
        let options = StandOptions::default();
        let mut out: Vec<Registration> = self
            .placements
            .iter()
            .map(|name| {
                Registration::placement(PlainPlacement::new(
                    name.clone(),
                    PlacementParams::default(),
                    None,
                    LogSurface::boxed(name),
                ))
            })
            .collect();
        for name in &self.totems {
            out.push(Registration::stand(Totem::new(
                name,
                &options,
                &mut LogSurface::boxed,
            )));
        }
        for name in &self.billboards {
            out.push(Registration::stand(Billboard::new(
                name,
                AspectRatio::Landscape16x9,
                &options,
                &mut LogSurface::boxed,
            )));
        }
        out
    }
}

fn load_prefs(args: &Args) -> Result<AgentPrefs> {
    // Config (best-effort)
    let Ok(config) = FsConfigStore::new().map(ConfigService::new) else {
        warn!("config dir unavailable, using defaults");
        let mut prefs = AgentPrefs::default();
        args.apply(&mut prefs);
        prefs.validate().context("invalid agent prefs")?;
        return Ok(prefs);
    };

    // Persist defaults once if absent
    match config.load_or_init::<AgentPrefs>(AGENT_PREFS_KEY) {
        Ok((_, Some(err))) => warn!(%err, "could not persist default prefs"),
        Ok(_) => {}
        Err(err) => warn!(%err, "stored prefs unreadable"),
    }
    info!(dir = %config.store().base().display(), "prefs loaded");

    config
        .agent_prefs(|prefs| args.apply(prefs))
        .context("invalid agent prefs")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = load_prefs(&args)?;
    let registrations = args.registrations();
    if registrations.is_empty() && prefs.ui_positions.is_empty() {
        bail!("nothing to serve: pass --placement, --totem, --billboard or --ui");
    }

    let host = LocalHost::new(&args.parcel, args.user.clone(), args.present);
    let fetcher = HttpFetcher::new().context("build http client")?;
    let positions = prefs.ui_positions.clone();
    let mut agent = SupplyAgent::new(prefs, fetcher, host);
    agent
        .add_placement(registrations)
        .context("register placements")?;
    if !positions.is_empty() {
        agent
            .allow_ui_placements(&positions)
            .context("allow overlays")?;
    }

    drive(&mut agent, async {
        // Ctrl+C
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(%err, "ctrl-c handler unavailable, running until killed");
            std::future::pending::<()>().await;
        }
    })
    .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ads_scene_port::Placement;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_stored_prefs() {
        let args = Args::parse_from([
            "ads-supply",
            "--adserver",
            "https://ads.example",
            "--wallet",
            "0xABCDEF",
            "--chain",
            "bsc",
            "--ui",
            "top",
            "--ui",
            "center",
            "--rearm",
            "--failure-backoff-ms",
            "15000",
        ]);
        let mut prefs = AgentPrefs::new("https://stored.example", "ads:stored");
        prefs.ui_positions = vec![UiPosition::Left];
        args.apply(&mut prefs);

        assert_eq!(prefs.adserver, "https://ads.example");
        assert_eq!(prefs.publisher, "bsc:0xabcdef");
        assert_eq!(prefs.ui_positions, vec![UiPosition::Top, UiPosition::Center]);
        assert_eq!(prefs.ui_rearm, UiRearm::OnReentry);
        assert_eq!(prefs.ui_refresh, UiRefresh::Disabled);
        assert_eq!(prefs.failure_backoff_ms, Some(15_000));
    }

    #[test]
    fn absent_flags_keep_stored_prefs() {
        let args = Args::parse_from(["ads-supply"]);
        let stored = AgentPrefs::new("https://stored.example", "ads:stored");
        let mut prefs = stored.clone();
        args.apply(&mut prefs);
        assert_eq!(prefs, stored);
    }

    #[test]
    fn stands_expand_into_named_faces() {
        let args = Args::parse_from([
            "ads-supply",
            "--placement",
            "door",
            "--totem",
            "lobby",
            "--billboard",
            "roof",
            "--parcel",
            "-10,5",
        ]);
        let names: Vec<String> = args
            .registrations()
            .into_iter()
            .flat_map(Registration::into_placements)
            .map(|p| p.name().to_owned())
            .collect();
        assert_eq!(
            names,
            ["door", "lobby front", "lobby back", "roof front", "roof back"]
        );
        assert_eq!(args.parcel, "-10,5");
    }
}
