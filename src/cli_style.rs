use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use melody_catalog::catalog_store::{Album, Artist, Playlist, Track};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Magenta)));
    let good = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let bad = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));

    Styles::styled()
        .usage(heading)
        .header(heading)
        .literal(good)
        .invalid(bad)
        .error(bad)
        .valid(good)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const MAGENTA: Color = Color::Rgb {
        r: 255,
        g: 0,
        b: 255,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

mod box_chars {
    pub const SINGLE_HORIZONTAL: &str = "─";
    pub const SINGLE_VERTICAL: &str = "│";
    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";
    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";
    pub const BULLET_EMPTY: &str = "○";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_success(message: &str) {
    println!(
        " {} {}",
        box_chars::CHECK.with(colors::GREEN).bold(),
        message.with(colors::GREEN)
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        " {} {}",
        box_chars::CROSS_MARK.with(colors::RED).bold(),
        message.with(colors::RED)
    );
}

pub fn print_warning(message: &str) {
    println!(
        " {} {}",
        "⚠".with(colors::ORANGE).bold(),
        message.with(colors::ORANGE)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

/// Box-drawn table. Rows flagged as dimmed (hidden entities) print in grey.
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<(Vec<String>, bool)>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        TableBuilder {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            col_widths: headers.iter().map(|h| h.width()).collect(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>, dimmed: bool) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(cell.width());
            }
        }
        self.rows.push((row, dimmed));
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn border(&self, left: &str, join: &str, right: &str) {
        let line = self
            .col_widths
            .iter()
            .map(|width| box_chars::SINGLE_HORIZONTAL.repeat(width + 2))
            .collect::<Vec<_>>()
            .join(join);
        println!("{}", format!("{}{}{}", left, line, right).with(colors::MAGENTA));
    }

    pub fn print(&self) {
        let bar = box_chars::SINGLE_VERTICAL.with(colors::MAGENTA);

        self.border(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        );
        print!("{}", bar);
        for (header, width) in self.headers.iter().zip(&self.col_widths) {
            let padding = width.saturating_sub(header.width());
            print!(
                " {}{} {}",
                header.as_str().with(colors::MAGENTA).bold(),
                " ".repeat(padding),
                bar
            );
        }
        println!();
        self.border(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT);

        for (row, dimmed) in &self.rows {
            let color = if *dimmed { colors::DIM } else { colors::WHITE };
            print!("{}", bar);
            for (i, width) in self.col_widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(cell.width());
                print!(" {}{} {}", cell.with(color), " ".repeat(padding), bar);
            }
            println!();
        }

        self.border(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Catalog Listings
// ═══════════════════════════════════════════════════════════════════════════════

fn names(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_table(table: &TableBuilder, empty: &str) {
    if table.is_empty() {
        print_empty_list(empty);
    } else {
        table.print();
    }
}

pub fn print_tracks(tracks: &[Track]) {
    let mut table = TableBuilder::new(&["ID", "Track", "Artists", "#", "Album", "Released"]);
    for track in tracks {
        table.add_row(
            vec![
                track.id.clone(),
                track.name.clone(),
                names(&track.artists),
                track.track_number.to_string(),
                track.album.name.clone(),
                track.album.release_date.clone(),
            ],
            track.hidden,
        );
    }
    print_table(&table, "No tracks");
}

pub fn print_albums(albums: &[Album]) {
    let mut table = TableBuilder::new(&["ID", "Album", "Type", "Artists", "Tracks", "Released"]);
    for album in albums {
        table.add_row(
            vec![
                album.id.clone(),
                album.name.clone(),
                album.album_type.to_string(),
                names(&album.artists),
                album.total_tracks.to_string(),
                album.release_date.clone(),
            ],
            album.hidden,
        );
    }
    print_table(&table, "No albums");
}

pub fn print_artists(artists: &[Artist]) {
    let mut table = TableBuilder::new(&["ID", "Artist", "Following"]);
    for artist in artists {
        let follow = if artist.follow { "yes" } else { "no" };
        table.add_row(
            vec![artist.id.clone(), artist.name.clone(), follow.to_string()],
            artist.hidden,
        );
    }
    print_table(&table, "No artists");
}

pub fn print_playlist(playlist: &Playlist) {
    println!(
        "{} {}",
        playlist.name.as_str().with(colors::MAGENTA).bold(),
        format!("({})", playlist.id).with(colors::DIM)
    );
    let mut table = TableBuilder::new(&["#", "ID", "Track", "Artists", "Album"]);
    for (i, track) in playlist.tracks.iter().enumerate() {
        table.add_row(
            vec![
                (i + 1).to_string(),
                track.id.clone(),
                track.name.clone(),
                names(&track.artists),
                track.album.name.clone(),
            ],
            track.hidden,
        );
    }
    print_table(&table, "Empty playlist");
}

pub fn print_playlists(playlists: &[Playlist]) {
    let mut table = TableBuilder::new(&["ID", "Playlist", "Tracks"]);
    for playlist in playlists {
        table.add_row(
            vec![
                playlist.id.clone(),
                playlist.name.clone(),
                playlist.tracks.len().to_string(),
            ],
            false,
        );
    }
    print_table(&table, "No playlists");
}
