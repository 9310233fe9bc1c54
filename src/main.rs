use std::io::BufRead;
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use lifeboard::config::BoardConfig;
use lifeboard::core::health::{Health, average_body_weight, average_sleep, sleep_records};
use lifeboard::core::money::{MoneyKind, balance, category_totals};
use lifeboard::core::temporal::{in_month, month_with_prior_month_end, on_day};
use lifeboard::core::todo::total_time_taken;
use lifeboard::sync::{Board, Gateway, HttpStore, keyring};

enum Command {
    Digest(NaiveDate),
    StorePassword,
    ForgetPassword,
}

fn parse_month(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()
}

fn parse_args(today: NaiveDate) -> Result<Command, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--store-password") {
        return Ok(Command::StorePassword);
    }
    if args.iter().any(|a| a == "--forget-password") {
        return Ok(Command::ForgetPassword);
    }
    match args.iter().position(|a| a == "--month") {
        Some(i) => {
            let value = args.get(i + 1).ok_or("--month needs a YYYY-MM value")?;
            parse_month(value)
                .map(Command::Digest)
                .ok_or_else(|| format!("not a month: {}", value))
        }
        None => Ok(Command::Digest(today)),
    }
}

fn init_logging(config: &BoardConfig) {
    // Journal wrapper: lifeboard targets at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("lifeboard") {
                let max = if lifeboard::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    lifeboard::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("lifeboard".to_string()),
        Err(e) => {
            eprintln!("Journal unavailable, logging disabled: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so lifeboard debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

async fn store_password(config: &BoardConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.user_name.is_empty() {
        return Err(format!("set user_name in {}", BoardConfig::config_path().display()).into());
    }
    eprintln!("Password for {}:", config.user_name);
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim();

    let gateway = Gateway::new(Arc::new(HttpStore::new(config)?));
    gateway.login(&config.user_name, password).await?;
    keyring::store_password(&config.api_base_url, &config.user_name, password).await?;
    gateway.logout().await?;
    println!("Stored password for {}", config.user_name);
    Ok(())
}

async fn connect(config: &BoardConfig) -> Result<Board, Box<dyn std::error::Error>> {
    let gateway = Gateway::new(Arc::new(HttpStore::new(config)?));
    if gateway.authenticate().await.is_err() {
        let password = keyring::load_password(&config.api_base_url, &config.user_name)
            .await?
            .ok_or("no stored password, run with --store-password first")?;
        gateway.login(&config.user_name, &password).await?;
    }
    Ok(Board::new(gateway))
}

/// Sleep and weight summary for the month; nights count only computed sleep records.
fn health_line(logs: &[Health], month: NaiveDate) -> String {
    let health = month_with_prior_month_end(logs, month);
    let nights = sleep_records(&health);
    let sleep = average_sleep(&nights);
    format!(
        "Sleep avg {}h {:02}m over {} nights, weight avg {:.1}",
        sleep.hours,
        sleep.minutes,
        nights.len(),
        average_body_weight(&in_month(&health, month))
    )
}

fn print_digest(board: &Board, month: NaiveDate, today: NaiveDate) {
    println!("=== {} ===\n", month.format("%Y-%m"));

    let todos = board.todos().with(|todos| in_month(todos, month));
    let done = todos.iter().filter(|t| t.completed).count();
    println!("Todos: {} of {} completed", done, todos.len());
    let worked = board
        .time_taken()
        .with(|segments| total_time_taken(&on_day(segments, today), today));
    println!("Worked today: {}h {:02}m", worked.hours, worked.minutes);

    let todo_rows = board.todos().snapshot();
    for project in board.projects().snapshot().iter().filter(|p| !p.completed) {
        let (finished, total) = project.completion_ratio(&todo_rows);
        let end = project.end.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!("  {} [{}/{}] due {}", project.name, finished, total, end);
    }

    let money = board.money().with(|money| in_month(money, month));
    let totals = balance(&money);
    println!(
        "\nIncome {}  Expense {}  Balance {}",
        totals.income, totals.expense, totals.balance
    );
    for (category, amount) in category_totals(&money, MoneyKind::Expense) {
        println!("  {} {}", category.as_wire(), amount);
    }

    println!("\n{}", board.health().with(|logs| health_line(logs, month)));

    if let Some(memo) = board.monthly_memo(month) {
        println!("\nMemo:\n{}", memo.memo);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BoardConfig::load()?;
    init_logging(&config);

    let today = Local::now().date_naive();
    let command = parse_args(today)?;

    let month = match command {
        Command::StorePassword => return store_password(&config).await,
        Command::ForgetPassword => {
            keyring::delete_password(&config.api_base_url, &config.user_name).await?;
            return Ok(());
        }
        Command::Digest(month) => month,
    };

    let board = connect(&config).await?;
    let failed = board.fetch_all().await;
    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|t| t.as_wire()).collect();
        eprintln!("Could not load: {}", names.join(", "));
    }
    print_digest(&board, month, today);
    Ok(())
}
