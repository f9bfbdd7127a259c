use crate::config;
use crate::picker::session::Session;
use crate::picker::spin::SpinAction;
use crate::picker::storage::{FileStore, KvStore, MemStore};
use crate::picker::transfer;
use log::info;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

type ShellSession = Session<Box<dyn KvStore>>;

pub fn run() -> Result<(), Box<dyn Error>> {
    let cfg = config::get();
    let store: Box<dyn KvStore> = if cfg.persist {
        Box::new(FileStore::new(cfg.save_dir.clone()))
    } else {
        info!("Persistence disabled; state lives for this session only.");
        Box::new(MemStore::new())
    };
    let mut session = Session::new(store);

    println!("spinpick - weighted random picker");
    println!("Type 'help' for commands.");
    print_items(&session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (cmd, rest) = split_command(input);
        match cmd {
            "add" => {
                if session.add_item(rest) {
                    print_items(&session);
                } else {
                    println!("Nothing to add.");
                }
            }
            "bulk" => {
                println!("One item per line; finish with a single '.' line.");
                let mut buf = String::new();
                for bulk_line in lines.by_ref() {
                    let bulk_line = bulk_line?;
                    if bulk_line.trim() == "." {
                        break;
                    }
                    buf.push_str(&bulk_line);
                    buf.push('\n');
                }
                let added = session.add_bulk(&buf);
                println!("Added {added} item(s).");
            }
            "rm" => match resolve_id(&session, rest) {
                Some(id) => {
                    session.remove_item(&id);
                    print_items(&session);
                }
                None => println!("No item matches '{rest}'."),
            },
            "list" | "ls" => print_items(&session),
            "weight" => set_weight(&mut session, rest),
            "avoid" => match rest {
                "on" => session.set_avoid_repeats(true),
                "off" => session.set_avoid_repeats(false),
                _ => println!(
                    "Avoid repeats is {}. Use 'avoid on' or 'avoid off'.",
                    if session.state().avoid_repeats { "on" } else { "off" }
                ),
            },
            "pick" | "spin" => run_spin(&mut session),
            "history" => print_history(&session),
            "clear" => {
                session.clear_items();
                println!("List cleared.");
            }
            "export" => do_export(&session, rest),
            "import" => do_import(&mut session, rest),
            "help" => print_help(),
            "quit" | "exit" | "q" => break,
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }
    Ok(())
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    }
}

/// Accepts a 1-based list position or a full item id.
fn resolve_id(session: &ShellSession, arg: &str) -> Option<String> {
    let items = &session.state().items;
    if let Ok(pos) = arg.parse::<usize>() {
        return items.get(pos.checked_sub(1)?).map(|i| i.id.clone());
    }
    items.iter().find(|i| i.id == arg).map(|i| i.id.clone())
}

fn set_weight(session: &mut ShellSession, rest: &str) {
    let Some((target, weight)) = rest.rsplit_once(char::is_whitespace) else {
        println!("Usage: weight <index|id> <1-10>");
        return;
    };
    let Ok(weight) = weight.trim().parse::<u32>() else {
        println!("Usage: weight <index|id> <1-10>");
        return;
    };
    match resolve_id(session, target.trim()) {
        Some(id) => {
            session.set_weight(&id, weight);
            print_items(session);
        }
        None => println!("No item matches '{}'.", target.trim()),
    }
}

/// Runs a started spin to completion, drawing the cursor walk on one line.
fn run_spin(session: &mut ShellSession) {
    if !session.pick_random() {
        if session.is_spinning() {
            println!("A spin is already running.");
        } else {
            println!("Nothing to pick from. Add some items first.");
        }
        return;
    }

    let frame_delay = Duration::from_millis(u64::from(config::get().frame_delay_ms));
    let mut last_frame = Instant::now();
    loop {
        std::thread::sleep(frame_delay);
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        match session.tick(dt) {
            SpinAction::Cursor(index) => render_cursor(session, index),
            SpinAction::Winner { index, text } => {
                render_cursor(session, index);
                println!();
                println!("*** {text} ***");
            }
            SpinAction::Unlocked => break,
            SpinAction::None => {}
        }
    }
}

fn render_cursor(session: &ShellSession, index: usize) {
    let text = session
        .state()
        .items
        .get(index)
        .map(|i| i.text.as_str())
        .unwrap_or("?");
    // Carriage return keeps the walk on a single row.
    print!("\r  [{:>3}] {:<40}", index + 1, text);
    let _ = io::stdout().flush();
}

fn print_items(session: &ShellSession) {
    let state = session.state();
    if state.items.is_empty() {
        println!("(no items - 'add <text>' to get started)");
        return;
    }
    for (i, item) in state.items.iter().enumerate() {
        let marker = if session.selected() == Some(item.text.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(
            " {marker}[{:>3}] w{:<2} {}  ({})",
            i + 1,
            item.weight,
            item.text,
            item.id
        );
    }
    println!(
        "{} item(s), avoid repeats: {}",
        state.items.len(),
        if state.avoid_repeats { "on" } else { "off" }
    );
}

fn print_history(session: &ShellSession) {
    let history = &session.state().history;
    if history.is_empty() {
        println!("No winners yet.");
        return;
    }
    for (i, text) in history.iter().enumerate() {
        println!(" #{:<2} {text}", i + 1);
    }
}

fn do_export(session: &ShellSession, rest: &str) {
    let (payload, path) = match split_command(rest) {
        ("items", path) => (session.export_items_json(), path),
        _ => (session.export_state_json(), rest),
    };
    let path = if path.is_empty() {
        transfer::default_export_path()
    } else {
        PathBuf::from(path)
    };
    match transfer::export_file(&path, &payload) {
        Ok(()) => println!("Exported to {}", path.display()),
        Err(e) => println!("Export failed: {e}"),
    }
}

fn do_import(session: &mut ShellSession, rest: &str) {
    if rest.is_empty() {
        println!("Usage: import <path>");
        return;
    }
    let path = Path::new(rest);
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            println!("Import failed: could not read {}: {e}", path.display());
            return;
        }
    };
    match session.import_text(&text) {
        Ok(()) => print_items(session),
        Err(e) => println!("Import failed: {e}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  add <text>           add an item (weight 5)");
    println!("  bulk                 add several items, one per line");
    println!("  rm <index|id>        remove an item");
    println!("  list                 show the list");
    println!("  weight <i|id> <1-10> set an item's weight");
    println!("  avoid [on|off]       show or set the avoid-repeats flag");
    println!("  pick                 spin and pick a winner");
    println!("  history              show past winners (newest first)");
    println!("  clear                remove all items (history is kept)");
    println!("  export [items] [path]  write the list as JSON");
    println!("  import <path>        replace the list from a JSON file");
    println!("  quit                 leave");
}
