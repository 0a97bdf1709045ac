use routebind::Param;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
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

pub fn print_graph(route: &str, params: &[Param], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Route: \"{}\"", route), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Parameters ━━━", ansi::GRAY));
    if params.is_empty() {
        println!("{}", palette.dim("  No parameters"));
        return;
    }

    let width = params.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for (idx, param) in params.iter().enumerate() {
        let key = if param.lookup_key.is_primary() {
            palette.dim(param.lookup_key.as_str())
        } else {
            palette.paint(param.lookup_key.as_str(), ansi::GREEN)
        };
        let scope = match &param.parent {
            Some(parent) => palette.paint(format!("  scoped → {}", parent), ansi::YELLOW),
            None => String::new(),
        };
        println!(
            "  {} {}  {}{}{}",
            palette.dim(format!("{idx:>2}")),
            palette.bold(format!("{:<width$}", param.name)),
            palette.dim("key="),
            key,
            scope
        );
    }

    println!("\n{}", palette.paint("━━━ Scope chains ━━━", ansi::GRAY));
    for chain in scope_chains(params) {
        println!("  {}", chain.join(palette.dim(" → ").as_str()));
    }
    println!();
}

/// Group params into chains: an unscoped param followed by the scoped params hanging off it.
fn scope_chains(params: &[Param]) -> Vec<Vec<&str>> {
    let mut chains: Vec<Vec<&str>> = Vec::new();
    for param in params {
        match chains.last_mut() {
            Some(chain) if param.scoped => chain.push(&param.name),
            _ => chains.push(vec![&param.name]),
        }
    }
    chains
}
