//! Commandes saisies sur l'entrée standard.

use anyhow::{Result, anyhow, bail};

#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Play(String),
    Next,
    Previous,
    Select(usize),
    Seek(String),
    Shuffle(bool),
    Pause,
    Resume,
    Stop,
    Clear,
    Volume(f64),
    Mute(bool),
    Radio(Option<String>),
    Trash,
    ExitRadio,
    Status,
    Queue,
    Modes,
    Devices,
    Use(String),
    Log(String),
    Help,
    Quit,
}

pub const HELP: &str = "\
play <identifier>     résout et joue un identifiant cloudmusic:// ou une URL
next | prev           piste suivante / précédente
select <n>            saute à la n-ième piste de la file
seek <hh:mm:ss|secs>  position dans la piste courante
shuffle on|off        lecture aléatoire
pause | resume | stop
clear                 vide la file
volume <0..1>         volume
mute on|off
radio [mode]          démarre la radio personnelle
trash                 écarte la piste radio courante
exitradio             quitte la radio
status                état du périphérique courant
queue                 file de lecture (ordre d'origine, pour local/playlist?index=n)
modes                 modes radio disponibles
devices               périphériques configurés
use <device>          change de périphérique cible
log <level>           niveau de log (error, warn, info, debug, trace)
quit";

/// Analyse une ligne ; `Ok(None)` pour une ligne vide
pub fn parse_line(line: &str) -> Result<Option<HostCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "play" | "p" => HostCommand::Play(required(rest, "play")?.to_string()),
        "next" | "n" => HostCommand::Next,
        "prev" | "previous" => HostCommand::Previous,
        "select" => {
            let index = required(rest, "select")?
                .parse::<usize>()
                .map_err(|_| anyhow!("Invalid queue index '{}'", rest))?;
            HostCommand::Select(index)
        }
        "seek" => HostCommand::Seek(required(rest, "seek")?.to_string()),
        "shuffle" => HostCommand::Shuffle(parse_switch(rest)?),
        "pause" => HostCommand::Pause,
        "resume" => HostCommand::Resume,
        "stop" => HostCommand::Stop,
        "clear" => HostCommand::Clear,
        "volume" | "vol" => {
            let level = required(rest, "volume")?
                .parse::<f64>()
                .map_err(|_| anyhow!("Invalid volume '{}'", rest))?;
            HostCommand::Volume(level)
        }
        "mute" => {
            if rest.is_empty() {
                HostCommand::Mute(true)
            } else {
                HostCommand::Mute(parse_switch(rest)?)
            }
        }
        "radio" => HostCommand::Radio((!rest.is_empty()).then(|| rest.to_string())),
        "trash" => HostCommand::Trash,
        "exitradio" => HostCommand::ExitRadio,
        "status" | "s" => HostCommand::Status,
        "queue" => HostCommand::Queue,
        "modes" => HostCommand::Modes,
        "devices" => HostCommand::Devices,
        "use" => HostCommand::Use(required(rest, "use")?.to_string()),
        "log" => HostCommand::Log(required(rest, "log")?.to_string()),
        "help" | "?" => HostCommand::Help,
        "quit" | "exit" | "q" => HostCommand::Quit,
        other => bail!("Unknown command '{}' (try 'help')", other),
    };
    Ok(Some(command))
}

fn required<'a>(rest: &'a str, verb: &str) -> Result<&'a str> {
    if rest.is_empty() {
        bail!("'{}' needs an argument", verb);
    }
    Ok(rest)
}

fn parse_switch(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => bail!("Expected on/off, got '{}'", other),
    }
}
