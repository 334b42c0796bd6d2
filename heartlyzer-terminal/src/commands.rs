/// One line typed at the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Anything not starting with `:` goes to the interview.
    Message(String),
    NewChat,
    History,
    /// Zero-based history index (typed one-based).
    Select(usize),
    Delete(usize),
    Clear,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "Perintah:
  :new        mulai percakapan baru
  :history    tampilkan riwayat analisis
  :select N   tampilkan analisis nomor N
  :delete N   hapus analisis nomor N
  :clear      hapus semua riwayat
  :help       tampilkan bantuan ini
  :quit       keluar";

fn position(arg: Option<&str>, command: &str) -> Result<usize, String> {
    arg.and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
        .ok_or_else(|| format!("{command} membutuhkan nomor riwayat, misalnya {command} 1"))
}

pub fn parse(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Input::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    let indexed = |make: fn(usize) -> Input, label: &str| match position(arg, label) {
        Ok(index) => make(index),
        Err(message) => Input::Invalid(message),
    };

    match name {
        "new" => Input::NewChat,
        "history" => Input::History,
        "select" => indexed(Input::Select, ":select"),
        "delete" => indexed(Input::Delete, ":delete"),
        "clear" => Input::Clear,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => Input::Invalid(format!("Perintah tidak dikenal: :{other}")),
    }
}
