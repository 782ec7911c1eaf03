use fdtregion::{Fdt, RegionReport, ScanStats};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_report(source: &str, fdt: &Fdt<'_>, report: &RegionReport, digest: Option<&str>, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Regions: {source}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Blocks ━━━", ansi::GRAY));
    print_blocks(fdt, &palette);

    println!("\n{}", palette.paint("━━━ Regions ━━━", ansi::GRAY));
    if report.regions.is_empty() {
        println!("{}", palette.dim("  No regions selected"));
    } else {
        print_regions(report, &palette);
    }

    println!("\n{}", palette.paint("━━━ Scan ━━━", ansi::GRAY));
    print_stats(&report.stats, report.total_size, &palette);

    if let Some(digest) = digest {
        println!("\n{}", palette.paint("━━━ SHA-256 ━━━", ansi::GRAY));
        println!("  {}", palette.bold(palette.paint(digest, ansi::GREEN)));
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", report.elapsed), ansi::GREEN));
    println!();
}

fn print_blocks(fdt: &Fdt<'_>, palette: &ansi::Palette) {
    let header = fdt.header();
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("version:"),
        palette.paint(header.version.to_string(), ansi::BLUE),
        palette.dim("totalsize:"),
        palette.paint(fdt.total_size().to_string(), ansi::BLUE),
        palette.dim("reservations:"),
        palette.paint(fdt.reservations().len().to_string(), ansi::BLUE),
    );
    for (name, block) in
        [("rsvmap", fdt.reservation_block()), ("struct", fdt.structure_block()), ("strings", fdt.strings_block())]
    {
        println!(
            "  {:<8} {} {}",
            palette.paint(name, ansi::CYAN),
            palette.paint(format!("{:#08x}..{:#08x}", block.offset, block.end()), ansi::YELLOW),
            palette.dim(format!("({} bytes)", block.size)),
        );
    }
}

fn print_regions(report: &RegionReport, palette: &ansi::Palette) {
    for (idx, found) in report.regions.iter().enumerate() {
        let path = if found.path.is_empty() { "-" } else { found.path.as_str() };
        println!(
            "  {} {} {} {:>6} {} {}",
            palette.paint(format!("[{idx}]"), ansi::GRAY),
            palette.paint(format!("{:#08x}..{:#08x}", found.region.offset, found.region.end()), ansi::YELLOW),
            palette.dim("│"),
            found.region.size,
            palette.dim("│"),
            palette.paint(path, ansi::BLUE),
        );
    }
}

fn print_stats(stats: &ScanStats, total_size: usize, palette: &ansi::Palette) {
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        palette.dim("tokens:"),
        palette.paint(stats.tokens.to_string(), ansi::YELLOW),
        palette.dim("nodes:"),
        palette.paint(stats.nodes.to_string(), ansi::YELLOW),
        palette.dim("properties:"),
        palette.paint(stats.properties.to_string(), ansi::YELLOW),
        palette.dim("predicate calls:"),
        palette.paint(stats.predicate_calls.to_string(), ansi::YELLOW),
    );
    let coverage = if total_size == 0 { 0.0 } else { stats.included_bytes as f64 * 100.0 / total_size as f64 };
    println!(
        "  {} {}  {} {}  {} {}",
        palette.dim("regions:"),
        palette.paint(stats.regions.to_string(), ansi::GREEN),
        palette.dim("supernodes:"),
        palette.paint(stats.supernodes.to_string(), ansi::CYAN),
        palette.dim("bytes:"),
        palette.paint(format!("{} ({coverage:.1}% of blob)", stats.included_bytes), ansi::GREEN),
    );
}
