// Command handlers and the interactive menu shell

use crate::messaging::account::{self, Login};
use crate::messaging::store::{render_list, Folder, MessageStore};
use crate::messaging::{ChatCli, ChatCommand};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Longest payload accepted by "send"; longer messages can still be stored
pub const MAX_SEND_LENGTH: usize = 250;

/// Quota used when registration input is not a number
pub const DEFAULT_QUOTA: i64 = 5;

const AUTH_MENU: &str = "1. Register\n2. Login\n3. Exit";

const MAIN_MENU: &str = "1. Send message
2. Store message
3. Disregard message
4. View sent messages
5. View stored messages
6. View disregarded messages
7. Display sender & recipient of all sent messages
8. Display longest message (all messages)
9. Search by message ID
10. Search messages by recipient
11. Delete a message by hash
12. Display full sent messages report
13. Logout / Exit";

/// Execute a parsed command line
pub fn execute_command(cli: &ChatCli) -> Result<()> {
    let data_file = cli.data_file();
    let store = MessageStore::open(&data_file);

    match cli.command() {
        ChatCommand::Run => handle_run(store),
        ChatCommand::Demo => handle_demo(store),
        ChatCommand::ListStored => handle_list_stored(&store),
        ChatCommand::Delete { hash } => handle_delete(store, &hash),
    }
}

fn handle_run(store: MessageStore) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(store, stdin.lock(), stdout.lock()).run()
}

fn handle_demo(mut store: MessageStore) -> Result<()> {
    if let Err(e) = store.populate_test_data() {
        warn!("Demo data not fully persisted: {}", e);
    }

    println!("== Sent report ==\n{}", store.sent_report());
    println!("== Senders & recipients ==\n{}", store.sender_recipient_summary());
    println!("== Stored ==\n{}", store.render_folder(Folder::Stored));
    println!("== Disregarded ==\n{}", store.render_folder(Folder::Disregarded));

    match store.longest_message() {
        Some(m) => println!("== Longest message ==\n{}", m.render()),
        None => println!("No messages."),
    }

    Ok(())
}

fn handle_list_stored(store: &MessageStore) -> Result<()> {
    println!("Stored file: {:?}", store.storage_path());
    println!("{}", store.render_folder(Folder::Stored));
    Ok(())
}

fn handle_delete(mut store: MessageStore, hash: &str) -> Result<()> {
    let removed = store
        .delete_by_hash(hash)
        .context("Message deleted but the stored file could not be updated")?;

    if removed {
        println!("✓ Message deleted.");
    } else {
        println!("Message hash not found.");
    }
    Ok(())
}

/// Menu-driven session over any line-oriented input and output
///
/// Reaching the end of input ends the session.
pub struct Shell<R, W> {
    store: MessageStore,
    login: Login,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(store: MessageStore, input: R, output: W) -> Self {
        Self {
            store,
            login: Login::new(),
            input,
            output,
        }
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub fn into_parts(self) -> (MessageStore, Login, W) {
        (self.store, self.login, self.output)
    }

    /// Authenticate, then serve the main menu until logout or end of input
    pub fn run(&mut self) -> Result<()> {
        if !self.authenticate()? {
            return Ok(());
        }

        loop {
            let Some(choice) = self.prompt(MAIN_MENU)? else {
                break;
            };

            let option: u32 = match choice.parse() {
                Ok(n) => n,
                Err(_) => {
                    self.say("Please enter a valid number.")?;
                    continue;
                }
            };

            match option {
                1 => self.send_message()?,
                2 => self.store_message()?,
                3 => self.disregard_message()?,
                4 | 12 => {
                    let report = self.store.sent_report();
                    self.say(&report)?;
                }
                5 => {
                    let text = self.store.render_folder(Folder::Stored);
                    self.say(&text)?;
                }
                6 => {
                    let text = self.store.render_folder(Folder::Disregarded);
                    self.say(&text)?;
                }
                7 => {
                    let summary = self.store.sender_recipient_summary();
                    self.say(&summary)?;
                }
                8 => {
                    let text = match self.store.longest_message() {
                        Some(m) => m.render(),
                        None => "No messages.".to_string(),
                    };
                    self.say(&text)?;
                }
                9 => self.search_by_id()?,
                10 => self.search_by_recipient()?,
                11 => self.delete_by_hash()?,
                13 => {
                    self.login.logout();
                    self.say("Goodbye!")?;
                    break;
                }
                _ => self.say("Choose a valid option.")?,
            }
        }

        Ok(())
    }

    /// Register/login loop. Returns false if the user exits first.
    fn authenticate(&mut self) -> Result<bool> {
        while self.login.logged_in_user().is_none() {
            let Some(choice) = self.prompt(AUTH_MENU)? else {
                return Ok(false);
            };

            match choice.as_str() {
                "1" => self.register()?,
                "2" => self.log_in()?,
                "3" => return Ok(false),
                _ => self.say("Choose a valid option.")?,
            }
        }
        Ok(true)
    }

    fn register(&mut self) -> Result<()> {
        let Some(first) = self.prompt("Enter first name:")? else { return Ok(()) };
        let Some(last) = self.prompt("Enter last name:")? else { return Ok(()) };
        let Some(username) = self.prompt("Enter username (must contain '_' and max 5 chars):")? else {
            return Ok(());
        };
        let Some(password) = self.prompt("Enter password (min 8 chars, uppercase, digit, special):")? else {
            return Ok(());
        };
        let Some(cell) = self.prompt("Enter cellphone (with international code, e.g. +27838968976):")? else {
            return Ok(());
        };
        let Some(quota) = self.prompt("How many messages should this user be allowed to send?")? else {
            return Ok(());
        };

        let quota = match quota.parse::<i64>() {
            Ok(q) => q,
            Err(_) => {
                self.say(&format!(
                    "Invalid number for quota; using {} as default.",
                    DEFAULT_QUOTA
                ))?;
                DEFAULT_QUOTA
            }
        };

        match self
            .login
            .register_user(&first, &last, &username, &password, &cell, quota)
        {
            Ok(()) => self.say("User successfully registered."),
            Err(e) => self.say(&e.to_string()),
        }
    }

    fn log_in(&mut self) -> Result<()> {
        let Some(username) = self.prompt("Login - Enter username:")? else { return Ok(()) };
        let Some(password) = self.prompt("Login - Enter password:")? else { return Ok(()) };

        self.login.login_user(&username, &password);
        let status = self.login.login_status();
        self.say(&status)
    }

    fn send_message(&mut self) -> Result<()> {
        match self.login.logged_in_user().map(|u| u.has_quota()) {
            None => return self.say("Not logged in."),
            Some(false) => return self.say("You have no messages left to send."),
            Some(true) => {}
        }

        let Some(recipient) = self.prompt_recipient()? else { return Ok(()) };
        let Some(payload) = self.prompt(&format!("Enter message (max {} chars):", MAX_SEND_LENGTH))? else {
            return Ok(());
        };

        if let Err(e) = account::check_payload_length(&payload, MAX_SEND_LENGTH) {
            return self.say(&format!("{} Use store instead.", e));
        }

        let message = self.store.compose(recipient, payload);
        self.store.add_sent(message);

        let remaining = match self.login.logged_in_user_mut() {
            Some(user) => {
                user.decrement_quota();
                user.quota()
            }
            None => 0,
        };
        info!("Message sent, {} remaining", remaining);
        self.say(&format!("Message sent. Messages remaining: {}", remaining))
    }

    fn store_message(&mut self) -> Result<()> {
        let Some(recipient) = self.prompt_recipient()? else { return Ok(()) };
        let Some(payload) = self.prompt("Enter message (this will be stored):")? else {
            return Ok(());
        };

        let message = self.store.compose(recipient, payload);
        match self.store.add_stored(message) {
            Ok(()) => self.say("Message stored."),
            Err(e) => self.say(&format!(
                "Message kept for this session but could not be saved: {}",
                e
            )),
        }
    }

    fn disregard_message(&mut self) -> Result<()> {
        let Some(recipient) = self.prompt_recipient()? else { return Ok(()) };
        let Some(payload) = self.prompt("Enter message (this will be disregarded):")? else {
            return Ok(());
        };

        let message = self.store.compose(recipient, payload);
        self.store.add_disregarded(message);
        self.say("Message disregarded.")
    }

    fn search_by_id(&mut self) -> Result<()> {
        let Some(id) = self.prompt("Enter message ID to search:")? else { return Ok(()) };

        let text = match self.store.find_by_id(&id) {
            Some(m) => m.render(),
            None => "Message not found.".to_string(),
        };
        self.say(&text)
    }

    fn search_by_recipient(&mut self) -> Result<()> {
        let Some(recipient) = self.prompt("Enter recipient to search:")? else { return Ok(()) };

        let found = self.store.find_by_recipient(&recipient);
        let text = if found.is_empty() {
            format!("No messages found for {}", recipient)
        } else {
            render_list(found.into_iter())
        };
        self.say(&text)
    }

    fn delete_by_hash(&mut self) -> Result<()> {
        let Some(hash) = self.prompt("Enter message hash to delete:")? else { return Ok(()) };

        let text = match self.store.delete_by_hash(&hash) {
            Ok(true) => "Message deleted.".to_string(),
            Ok(false) => "Message hash not found.".to_string(),
            Err(e) => format!("Message deleted but the stored file could not be updated: {}", e),
        };
        self.say(&text)
    }

    /// Ask for a recipient until it passes validation or input ends
    fn prompt_recipient(&mut self) -> Result<Option<String>> {
        loop {
            let Some(recipient) = self.prompt("Enter recipient (with +countrycode):")? else {
                return Ok(None);
            };
            if account::check_cellphone(&recipient) {
                return Ok(Some(recipient));
            }
            self.say(&account::ValidationError::Cellphone.to_string())?;
        }
    }

    /// Print `text` and read one trimmed line; `None` at end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run_script(script: &str) -> (tempfile::TempDir, MessageStore, Login, String) {
        let dir = tempdir().unwrap();
        let store = MessageStore::open(dir.path().join("storedMessages.json"));
        let mut shell = Shell::new(store, Cursor::new(script.to_string()), Vec::new());
        shell.run().unwrap();
        let (store, login, out) = shell.into_parts();
        (dir, store, login, String::from_utf8(out).unwrap())
    }

    const SIGN_UP: &str = "1\nKyle\nG\nkyl_1\nCh&&sec@ke99!\n+27838968976\n2\n2\nkyl_1\nCh&&sec@ke99!\n";

    #[test]
    fn test_exit_before_login() {
        let (_dir, store, login, out) = run_script("3\n");
        assert!(out.contains("1. Register"));
        assert!(login.users().is_empty());
        assert!(store.sent().is_empty());
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (_dir, _store, _login, out) = run_script("");
        assert!(out.contains("1. Register"));
    }

    #[test]
    fn test_send_decrements_quota() {
        let script = format!("{}1\n+27834557896\nDid you get the cake?\n13\n", SIGN_UP);
        let (_dir, store, login, out) = run_script(&script);

        assert!(out.contains("User successfully registered."));
        assert!(out.contains("Welcome Kyle ,G it is great to see you."));
        assert!(out.contains("Message sent. Messages remaining: 1"));
        assert!(out.contains("Goodbye!"));
        assert_eq!(store.sent().len(), 1);
        assert_eq!(login.users()[0].quota(), 1);
    }

    #[test]
    fn test_send_blocked_without_quota() {
        let script = format!(
            "{}1\n+27834557896\none\n1\n+27834557896\ntwo\n1\n13\n",
            SIGN_UP
        );
        let (_dir, store, _login, out) = run_script(&script);

        assert_eq!(store.sent().len(), 2);
        assert!(out.contains("You have no messages left to send."));
    }

    #[test]
    fn test_long_payload_is_not_sent() {
        let script = format!("{}1\n+27834557896\n{}\n13\n", SIGN_UP, "x".repeat(251));
        let (_dir, store, _login, out) = run_script(&script);

        assert!(store.sent().is_empty());
        assert!(out.contains("Use store instead."));
    }

    #[test]
    fn test_invalid_recipient_is_reprompted() {
        let script = format!("{}3\n0838884567\n+27834484567\nbye\n13\n", SIGN_UP);
        let (_dir, store, _login, out) = run_script(&script);

        assert!(out.contains("does not contain international code"));
        assert_eq!(store.disregarded().len(), 1);
        assert_eq!(store.disregarded()[0].recipient(), "+27834484567");
    }

    #[test]
    fn test_store_then_delete() {
        let script = format!("{}2\n+27838884567\nkeep me\n5\n13\n", SIGN_UP);
        let (dir, store, _login, out) = run_script(&script);

        assert!(out.contains("Message stored."));
        assert!(out.contains("Message: keep me"));
        let hash = store.stored()[0].message_hash().to_string();
        drop(store);

        let reopened = MessageStore::open(dir.path().join("storedMessages.json"));
        let mut shell = Shell::new(
            reopened,
            Cursor::new(format!("{}11\n{}\n11\n{}\n13\n", SIGN_UP, hash, hash)),
            Vec::new(),
        );
        shell.run().unwrap();
        let (store, _login, out) = shell.into_parts();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Message deleted."));
        assert!(out.contains("Message hash not found."));
        assert!(store.stored().is_empty());
    }

    #[test]
    fn test_bad_menu_input() {
        let script = format!("{}abc\n99\n8\n13\n", SIGN_UP);
        let (_dir, _store, _login, out) = run_script(&script);

        assert!(out.contains("Please enter a valid number."));
        assert!(out.contains("Choose a valid option."));
        assert!(out.contains("No messages."));
    }

    #[test]
    fn test_failed_login_stays_in_auth_loop() {
        let (_dir, _store, login, out) = run_script("2\nnobody\nnope\n3\n");
        assert!(out.contains("Username or password incorrect, please try again."));
        assert!(login.logged_in_user().is_none());
    }
}
