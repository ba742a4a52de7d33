//! Interactive console presentation
//!
//! A line-oriented stand-in for the original desktop window: a login prompt
//! consuming two string fields, then a menu of operations. Every service
//! call completes before the next prompt is shown; service errors are
//! rendered as one-line messages and never end the process.

use std::io::{self, BufRead, Write};

use crate::{
    error::AppResult,
    models::{CreateBook, CreateMember, Session, UpdateBook, UpdateMember},
    services::Services,
    validators,
};

const MENU: &str = "\
 1) Dashboard            8) Search members
 2) List books           9) Add member
 3) Search books        10) Update member
 4) Add book            11) Delete member
 5) Update book         12) Issue book
 6) Delete book         13) Return book
 7) List members        14) Loan history
15) Overdue notices     16) Change password
 q) Quit";

/// Run the login prompt followed by the main menu loop until the user
/// quits or stdin closes. An expired session drops back to the login
/// prompt.
pub async fn run(services: &Services) -> anyhow::Result<()> {
    'login: loop {
        let Some(mut session) = login(services).await? else {
            return Ok(());
        };

        println!("Welcome, {}.", session.user().username);

        loop {
            println!("\n{}", MENU);
            let Some(choice) = prompt("> ")? else {
                services.auth.logout(session);
                return Ok(());
            };

            if choice == "q" || choice == "quit" || choice == "0" {
                services.auth.logout(session);
                return Ok(());
            }

            if !keep_alive(&mut session) {
                println!("Session expired, please log in again.");
                services.auth.logout(session);
                continue 'login;
            }

            if let Err(e) = dispatch(services, &session, &choice).await {
                println!("Error: {}", e.user_message());
            }
        }
    }
}

/// Extend a still-valid session's timeout window; an expired session is
/// left alone and must go back through login.
fn keep_alive(session: &mut Session) -> bool {
    if !session.is_valid() {
        return false;
    }
    session.refresh();
    true
}

/// Prompt for credentials until a login succeeds. `None` means the user
/// gave up (EOF or blank username).
async fn login(services: &Services) -> anyhow::Result<Option<Session>> {
    loop {
        let Some(username) = prompt("Username: ")? else {
            return Ok(None);
        };
        if username.is_empty() {
            return Ok(None);
        }
        let Some(password) = prompt("Password: ")? else {
            return Ok(None);
        };

        match services.auth.login(&username, &password).await {
            Ok(session) => return Ok(Some(session)),
            Err(e) => println!("{}", e.user_message()),
        }
    }
}

async fn dispatch(services: &Services, session: &Session, choice: &str) -> AppResult<()> {
    match choice {
        "1" => show_dashboard(services).await,
        "2" => list_books(services).await,
        "3" => search_books(services).await,
        "4" => add_book(services, session).await,
        "5" => update_book(services, session).await,
        "6" => delete_book(services, session).await,
        "7" => list_members(services).await,
        "8" => search_members(services).await,
        "9" => add_member(services, session).await,
        "10" => update_member(services, session).await,
        "11" => delete_member(services, session).await,
        "12" => issue_book(services, session).await,
        "13" => return_book(services, session).await,
        "14" => loan_history(services).await,
        "15" => overdue_notices(services).await,
        "16" => change_password(services, session).await,
        _ => {
            println!("Unknown choice.");
            Ok(())
        }
    }
}

async fn show_dashboard(services: &Services) -> AppResult<()> {
    let stats = services.stats.dashboard().await?;
    println!("Books: {}  Copies available: {}", stats.total_books, stats.available_copies);
    println!(
        "Members: {}  Active loans: {}  Overdue: {}",
        stats.total_members, stats.active_loans, stats.overdue_loans
    );
    Ok(())
}

async fn list_books(services: &Services) -> AppResult<()> {
    print_books(&services.catalog.list_books().await?);
    Ok(())
}

async fn search_books(services: &Services) -> AppResult<()> {
    let Some(query) = prompt("Search: ")? else {
        return Ok(());
    };
    print_books(&services.catalog.search_books(&query).await?);
    Ok(())
}

async fn add_book(services: &Services, session: &Session) -> AppResult<()> {
    let Some(isbn) = prompt("ISBN: ")? else {
        return Ok(());
    };
    if !validators::is_valid_isbn(&isbn) {
        println!("Invalid ISBN.");
        return Ok(());
    }
    let (Some(title), Some(author), Some(copies)) =
        (prompt("Title: ")?, prompt("Author: ")?, prompt("Copies: ")?)
    else {
        return Ok(());
    };
    let Some(total_copies) = parse_number(&copies) else {
        return Ok(());
    };

    let book = services
        .catalog
        .add_book(session, CreateBook { isbn, title, author, total_copies })
        .await?;
    println!("Added '{}' ({}).", book.title, book.isbn);
    Ok(())
}

async fn update_book(services: &Services, session: &Session) -> AppResult<()> {
    let Some(isbn) = prompt("ISBN: ")? else {
        return Ok(());
    };
    println!("Leave a field blank to keep its current value.");
    let (Some(title), Some(author), Some(copies)) =
        (prompt("Title: ")?, prompt("Author: ")?, prompt("Copies: ")?)
    else {
        return Ok(());
    };

    let total_copies = if copies.is_empty() {
        None
    } else {
        match parse_number(&copies) {
            Some(n) => Some(n),
            None => return Ok(()),
        }
    };

    let update = UpdateBook {
        title: non_empty(title),
        author: non_empty(author),
        total_copies,
    };

    let book = services.catalog.update_book(session, &isbn, update).await?;
    println!(
        "Updated '{}' ({}), {}/{} copies available.",
        book.title, book.isbn, book.available_copies, book.total_copies
    );
    Ok(())
}

async fn delete_book(services: &Services, session: &Session) -> AppResult<()> {
    let Some(isbn) = prompt("ISBN: ")? else {
        return Ok(());
    };
    services.catalog.delete_book(session, &isbn).await?;
    println!("Deleted {}.", isbn);
    Ok(())
}

async fn list_members(services: &Services) -> AppResult<()> {
    print_members(&services.members.list_members().await?);
    Ok(())
}

async fn search_members(services: &Services) -> AppResult<()> {
    let Some(query) = prompt("Search: ")? else {
        return Ok(());
    };
    print_members(&services.members.search_members(&query).await?);
    Ok(())
}

async fn add_member(services: &Services, session: &Session) -> AppResult<()> {
    let (Some(name), Some(email), Some(phone)) =
        (prompt("Name: ")?, prompt("Email: ")?, prompt("Phone: ")?)
    else {
        return Ok(());
    };

    let member = services
        .members
        .add_member(session, CreateMember { name, email, phone })
        .await?;
    println!("Registered '{}' with id {}.", member.name, member.id);
    Ok(())
}

async fn update_member(services: &Services, session: &Session) -> AppResult<()> {
    let Some(id) = prompt("Member id: ")? else {
        return Ok(());
    };
    let Some(id) = parse_number(&id) else {
        return Ok(());
    };
    println!("Leave a field blank to keep its current value.");
    let (Some(name), Some(email), Some(phone)) =
        (prompt("Name: ")?, prompt("Email: ")?, prompt("Phone: ")?)
    else {
        return Ok(());
    };

    let update = UpdateMember {
        name: non_empty(name),
        email: non_empty(email),
        phone: non_empty(phone),
    };

    let member = services.members.update_member(session, id, update).await?;
    println!("Updated member {} ({}).", member.id, member.name);
    Ok(())
}

async fn delete_member(services: &Services, session: &Session) -> AppResult<()> {
    let Some(id) = prompt("Member id: ")? else {
        return Ok(());
    };
    let Some(id) = parse_number(&id) else {
        return Ok(());
    };
    services.members.delete_member(session, id).await?;
    println!("Deleted member {}.", id);
    Ok(())
}

async fn issue_book(services: &Services, session: &Session) -> AppResult<()> {
    let Some(isbn) = prompt("ISBN: ")? else {
        return Ok(());
    };
    if !validators::is_valid_isbn(&isbn) {
        println!("Invalid ISBN.");
        return Ok(());
    }
    let Some(member_id) = prompt("Member id: ")? else {
        return Ok(());
    };
    let Some(member_id) = parse_number(&member_id) else {
        return Ok(());
    };

    let loan = services.circulation.issue_book(session, &isbn, member_id).await?;
    println!(
        "Issued as loan {}, due {}.",
        loan.id,
        loan.due_date.format("%Y-%m-%d")
    );
    Ok(())
}

async fn return_book(services: &Services, session: &Session) -> AppResult<()> {
    let Some(loan_id) = prompt("Loan id: ")? else {
        return Ok(());
    };
    let Some(loan_id) = parse_number(&loan_id) else {
        return Ok(());
    };

    let (loan, overdue) = services.circulation.return_book(session, loan_id).await?;
    if overdue {
        println!("Returned loan {}, it was overdue.", loan.id);
    } else {
        println!("Returned loan {}.", loan.id);
    }
    Ok(())
}

async fn loan_history(services: &Services) -> AppResult<()> {
    let Some(kind) = prompt("History by (m)ember or (b)ook? ")? else {
        return Ok(());
    };

    let records = match kind.as_str() {
        "m" => {
            let Some(id) = prompt("Member id: ")? else {
                return Ok(());
            };
            let Some(id) = parse_number(&id) else {
                return Ok(());
            };
            services.circulation.loans_for_member(id).await?
        }
        "b" => {
            let Some(isbn) = prompt("ISBN: ")? else {
                return Ok(());
            };
            services.circulation.loans_for_book(&isbn).await?
        }
        _ => {
            println!("Unknown choice.");
            return Ok(());
        }
    };

    if records.is_empty() {
        println!("No loans found.");
    }
    for r in records {
        let status = match r.returned_date {
            Some(date) => format!("returned {}", date.format("%Y-%m-%d")),
            None => "open".to_string(),
        };
        println!(
            "#{} '{}' ({}) to {}: issued {}, due {}, {}",
            r.id,
            r.book_title,
            r.book_isbn,
            r.member_name,
            r.issue_date.format("%Y-%m-%d"),
            r.due_date.format("%Y-%m-%d"),
            status
        );
    }
    Ok(())
}

async fn overdue_notices(services: &Services) -> AppResult<()> {
    let notices = services.reminders.overdue_notices().await?;
    if notices.is_empty() {
        println!("Nothing is overdue.");
    }
    for notice in notices {
        println!("\n{}\n", notice.body);
    }
    Ok(())
}

async fn change_password(services: &Services, session: &Session) -> AppResult<()> {
    let (Some(current), Some(new)) =
        (prompt("Current password: ")?, prompt("New password: ")?)
    else {
        return Ok(());
    };
    services.auth.change_password(session, &current, &new).await?;
    println!("Password changed.");
    Ok(())
}

fn print_books(books: &[crate::models::Book]) {
    if books.is_empty() {
        println!("No books found.");
    }
    for book in books {
        println!(
            "{} - '{}' by {} ({}/{} available)",
            book.isbn, book.title, book.author, book.available_copies, book.total_copies
        );
    }
}

fn print_members(members: &[crate::models::Member]) {
    if members.is_empty() {
        println!("No members found.");
    }
    for member in members {
        println!(
            "#{} {} <{}> {} (joined {})",
            member.id,
            member.name,
            member.email,
            member.phone,
            member.joined_date.format("%Y-%m-%d")
        );
    }
}

fn parse_number(input: &str) -> Option<i64> {
    match input.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            println!("Expected a number, got '{}'.", input);
            None
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Print a prompt and read one trimmed line; `None` on end of input.
fn prompt(label: &str) -> io::Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
