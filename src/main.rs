use anyhow::{bail, Context, Result};
use std::env;

use club_booking::{init_logging, BookingError, BookingService, Config, MAX_PLACES_PER_CLUB};

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = Config::from_env();

    let service = BookingService::from_config(&config)
        .with_context(|| format!("Failed to open booking data in {:?}", config.data_dir))?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["leaderboard"] => run_leaderboard(&service)?,
        ["login", email] => run_login(&service, email)?,
        ["limits", club, competition] => run_limits(&service, club, competition)?,
        ["book", club, competition, places] => run_book(&service, club, competition, places)?,
        ["history", club] => run_history(&service, club)?,
        _ => {
            print_usage();
            bail!("unrecognised arguments: {:?}", args);
        }
    }

    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  club-booking leaderboard");
    eprintln!("  club-booking login <email>");
    eprintln!("  club-booking limits <club> <competition>");
    eprintln!("  club-booking book <club> <competition> <places>");
    eprintln!("  club-booking history <club>");
}

fn run_leaderboard(service: &BookingService) -> Result<()> {
    println!("🏆 Public Points Dashboard");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for entry in service.leaderboard()? {
        println!("{:>3}. {:<30} {:>4} pts", entry.rank, entry.club, entry.points);
    }

    Ok(())
}

fn run_login(service: &BookingService, email: &str) -> Result<()> {
    let club = match service.login(email) {
        Ok(club) => club,
        Err(e @ BookingError::UnknownEmail(_)) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("Welcome, {}", club.email);
    println!("Points available: {}", club.points);
    println!("\nCompetitions:");
    for comp in service.competitions()? {
        println!("  • {} ({}) - {} places", comp.name, comp.date, comp.places);
    }

    Ok(())
}

fn run_limits(service: &BookingService, club: &str, competition: &str) -> Result<()> {
    let page = service.booking_page(club, competition)?;
    let limits = page.limits;

    println!("📋 {} → {}", page.club.name, page.competition.name);
    if page.closed {
        println!("This competition has already taken place. Booking is closed.");
        return Ok(());
    }
    if limits.places_already_booked > 0 {
        println!(
            "Your club has already booked {} places for this competition.",
            limits.places_already_booked
        );
    }
    if limits.is_exhausted() {
        if limits.remaining_from_cap == 0 {
            println!(
                "You have reached the maximum of {} places for this competition.",
                MAX_PLACES_PER_CLUB
            );
        } else {
            println!("No more places can be booked right now.");
        }
        return Ok(());
    }
    println!("You can book up to {} more places.", limits.max_remaining);
    println!(
        "  (cap: {} | points: {} | places left: {})",
        limits.remaining_from_cap, limits.club_points, limits.available_places
    );

    Ok(())
}

fn run_book(service: &BookingService, club: &str, competition: &str, places: &str) -> Result<()> {
    match service.book(club, competition, places) {
        Ok(receipt) => {
            println!("Great-booking complete!");
            println!(
                "✓ Booking #{}: {} places for {}",
                receipt.booking.id, receipt.booking.places, receipt.booking.competition
            );
            println!("✓ Points remaining: {}", receipt.club_points);
            if !receipt.flushed {
                println!("⚠️  Saved to journal only; data files will be updated on next run");
            }
            Ok(())
        }
        Err(BookingError::Rejected { reason, limits }) => {
            eprintln!("❌ {}", reason);
            eprintln!("   You can book up to {} more places.", limits.max_remaining);
            std::process::exit(2);
        }
        Err(e) if e.is_lookup_error() => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn run_history(service: &BookingService, club: &str) -> Result<()> {
    let bookings = service.bookings_for_club(club)?;

    println!("📜 Bookings for {} ({})", club, bookings.len());
    for b in bookings {
        println!(
            "  #{:<4} {:<25} {:>2} places  {}  {}",
            b.id,
            b.competition,
            b.places,
            b.created_at.format(club_booking::TIMESTAMP_FORMAT),
            b.status.as_str()
        );
    }

    Ok(())
}
