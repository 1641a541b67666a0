//! Library management commands

use anyhow::{bail, Context, Result};
use folio_core::library::NO_SHELF;
use folio_core::{Book, Library, ALL_BOOKS};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Copy a book into the library
pub async fn import(library: &Library, file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("No such file: {}", file.display());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Importing {}...", file.display()));

    let book = library
        .import(file)
        .await
        .with_context(|| format!("Failed to import {}", file.display()))?;

    pb.finish_and_clear();
    println!(
        "Imported '{}' by {} as {}",
        book.title,
        book.author,
        book.file_name()
    );
    Ok(())
}

/// List books, optionally filtered by shelf
pub async fn list(library: &Library, shelf: Option<&str>, json: bool) -> Result<()> {
    let books = library
        .books_on_shelf(shelf.unwrap_or(ALL_BOOKS))
        .await
        .with_context(|| format!("Failed to read library {}", library.root().display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books found");
        return Ok(());
    }
    for book in &books {
        println!(
            "{:<32} {:<32} {:<24} {}",
            book.file_name(),
            book.title,
            book.author,
            book.shelf.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Assign a book to a shelf, adding the shelf to the collection if needed
pub async fn shelf(library: &Library, file: &str, shelf: &str) -> Result<()> {
    let book = find_book(library, file).await?;
    let shelf = shelf.trim();
    let target = (!shelf.is_empty() && shelf != NO_SHELF).then(|| shelf.to_string());

    library
        .set_shelf(&book, target.clone())
        .await
        .context("Shelf update task failed")?;

    if let Some(name) = &target {
        let mut shelves = library.shelves().await?;
        if shelves.add_shelf(name) {
            library.save_shelves(&shelves).await?;
        }
        println!("Moved {} to '{}'", book.file_name(), name);
    } else {
        println!("Took {} off its shelf", book.file_name());
    }
    Ok(())
}

/// Print the shelf collection, or add/remove a shelf
pub async fn shelves(library: &Library, add: Option<&str>, remove: Option<&str>) -> Result<()> {
    let mut shelves = library.shelves().await?;

    if let Some(name) = add {
        if !shelves.add_shelf(name) {
            bail!("Shelf '{}' is blank or already exists", name.trim());
        }
        library.save_shelves(&shelves).await?;
        println!("Added shelf '{}'", name.trim());
        return Ok(());
    }

    if let Some(name) = remove {
        if !shelves.remove_shelf(name) {
            bail!("No shelf named '{}'", name);
        }
        let moved = library.clear_shelf(name).await?;
        library.save_shelves(&shelves).await?;
        println!("Removed shelf '{}' ({} books taken off it)", name, moved);
        return Ok(());
    }

    for name in shelves.choices() {
        println!("{}", name);
    }
    Ok(())
}

/// Remove a book and its sidecar
pub async fn delete(library: &Library, file: &str) -> Result<()> {
    let book = find_book(library, file).await?;
    library
        .delete(&book)
        .await
        .with_context(|| format!("Failed to delete {}", file))?;
    println!("Deleted {}", book.file_name());
    Ok(())
}

async fn find_book(library: &Library, file: &str) -> Result<Book> {
    library
        .get(file)
        .await
        .with_context(|| format!("No book named {} in {}", file, library.root().display()))
}
