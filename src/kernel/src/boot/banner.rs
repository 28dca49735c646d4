//! Boot banner and branding.

use crate::console::display::Color;
use crate::{console, println};

/// Print the KaikuOS boot banner.
pub fn print_banner() {
    console::set_color(Color::Cyan, Color::Black);
    println!(" _  __     _ _           ___  ____  ");
    println!("| |/ /__ _(_) | ___   _ / _ \\/ ___| ");
    println!("| ' // _` | | |/ / | | | | | \\___ \\ ");
    println!("| . \\ (_| | |   <| |_| | |_| |___) |");
    println!("|_|\\_\\__,_|_|_|\\_\\\\__,_|\\___/|____/ ");
    println!();
    console::set_color(Color::White, Color::Black);
    println!(" KaikuOS v0.1.0");
    println!();
}
