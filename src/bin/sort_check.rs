use std::sync::Arc;

use lifeboard::config::BoardConfig;
use lifeboard::sync::{Board, Gateway, HttpStore, Subject, TableType, keyring};

#[tokio::main]
async fn main() {
    systemd_journal_logger::JournalLog::new()
        .unwrap()
        .with_syslog_identifier("lifeboard-sort-check".to_string())
        .install()
        .unwrap();
    log::set_max_level(log::LevelFilter::Info);

    let config = match BoardConfig::load() {
        Ok(c) => c,
        Err(e) => { println!("Config error: {}", e); return; }
    };

    println!("=== Sort order check: {} ===\n", config.api_base_url);

    let store = match HttpStore::new(&config) {
        Ok(s) => s,
        Err(e) => { println!("Client error: {}", e); return; }
    };
    let gateway = Gateway::new(Arc::new(store));

    if gateway.authenticate().await.is_err() {
        let password = match keyring::load_password(&config.api_base_url, &config.user_name).await {
            Ok(Some(pw)) => pw,
            Ok(None) => { println!("No stored password for {}", config.user_name); return; }
            Err(e) => { println!("Keyring error: {}", e); return; }
        };
        if let Err(e) = gateway.login(&config.user_name, &password).await {
            println!("Login failed: {}", e);
            return;
        }
    }

    let board = Board::new(gateway);
    for table in [TableType::Project, TableType::Section, TableType::Todo] {
        if !board.fetch(table).await {
            println!("Could not load {}", table.as_wire());
            return;
        }
    }

    println!(
        "Loaded {} projects, {} sections, {} todos\n",
        board.projects().len(),
        board.sections().len(),
        board.todos().len()
    );

    let broken = board.broken_sibling_groups();
    for group in &broken {
        let what = match group.subject {
            Subject::Tasks if group.group == 0 => "unsectioned todos".to_string(),
            Subject::Tasks => format!("todos of section {}", group.group),
            Subject::Sections => "sections".to_string(),
        };
        println!("  project {}: {} have sorts {:?}", group.project_id, what, group.sorts);
    }

    if broken.is_empty() {
        println!("All sibling groups contiguous!");
    } else {
        println!("\n{} groups out of order", broken.len());
    }

    println!("\n=== Done ===");
}
