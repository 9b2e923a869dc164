use anyhow::Result;

use scanbench::{
    boot, cli,
    config::Config,
    controller::Controller,
    notify::{LogNotifier, Notify, TelegramNotifier},
    station::StationClient,
};

fn main() -> Result<()> {
    boot::init_logging();
    let matches = cli::parse_args();

    let mut cfg = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    cfg.apply_env();
    if let Some(url) = matches.get_one::<String>("station-url") {
        cfg.station.base_url = url.clone();
    }
    cfg.validate()?;

    if matches.get_flag("print-config") {
        println!("{}", cfg.to_toml()?);
        return Ok(());
    }

    let station = StationClient::new(&cfg.station.base_url, cfg.station.request_timeout());
    let notifier: Box<dyn Notify> = match cfg.telegram.credentials() {
        Some((token, chat_id)) => {
            log::info!("Publishing status to Telegram chat {chat_id}");
            Box::new(TelegramNotifier::new(token, chat_id, cfg.telegram.timeout()))
        }
        None => {
            log::info!("No Telegram credentials configured; status goes to the log only");
            Box::new(LogNotifier)
        }
    };

    log::info!(
        "Targeting station at {} ({} board(s) expected)",
        cfg.station.base_url,
        cfg.boards.expected
    );
    let mut controller = Controller::new(station, notifier, cfg);
    controller.run()
}
