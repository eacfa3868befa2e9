use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::{Parser, Subcommand};
use log::info;
use quiz_alarm::{
    AlarmRegistry, AlarmSettings, AlarmTime, AudioSignal, Config, Difficulty, Message, MessageType,
    Question, QuestionGenerator,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// set an alarm and wait for it, it only stops once you solve a question
    Set {
        /// HH:MM, 24 hour
        time: String,
        #[clap(long, short)]
        difficulty: Option<Difficulty>,
        /// 0 to 100
        #[clap(long, short, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,
        /// sound file to loop instead of beeping
        #[clap(long, short)]
        sound: Option<PathBuf>,
        #[clap(long, short)]
        multiple_choice: bool,
        /// don't make any noise
        #[clap(long)]
        silent: bool,
    },
    /// answer questions until you get one right
    Quiz {
        #[clap(long, short)]
        difficulty: Option<Difficulty>,
        #[clap(long, short)]
        multiple_choice: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("quiz_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    match args.command {
        Command::Init { force } => {
            let path = Config::config_path()?;
            if force || !path.exists() {
                Config::new().save(&path)?;
                println!("wrote {}", path.display());
            } else {
                println!("{} already exists, use --force to overwrite it", path.display());
            }
        }
        Command::Set {
            time,
            difficulty,
            volume,
            sound,
            multiple_choice,
            silent,
        } => {
            let time: AlarmTime = time.parse()?;
            let mut config = Config::load_or_default()?;
            if let Some(difficulty) = difficulty {
                config.difficulty = difficulty;
            }
            if let Some(volume) = volume {
                config.volume = volume;
            }
            if sound.is_some() {
                config.sound = sound;
            }
            config.multiple_choice |= multiple_choice;
            let audio = if silent {
                AudioSignal::silent()
            } else {
                AudioSignal::rodio()
            };
            run_alarm(time, AlarmSettings::from(&config), audio)?;
        }
        Command::Quiz {
            difficulty,
            multiple_choice,
        } => {
            let config = Config::load_or_default()?;
            let questions = QuestionGenerator::new(
                difficulty.unwrap_or(config.difficulty),
                config.answer_mode,
                multiple_choice || config.multiple_choice,
            );
            let mut input = io::stdin().lock();
            loop {
                let question = questions.generate();
                if ask(&question, &mut input)? {
                    break;
                }
                println!("Wrong! The correct answer was {}. Try again.", question.answer);
            }
            println!("Correct!");
        }
    }
    Ok(())
}

fn run_alarm(time: AlarmTime, settings: AlarmSettings, audio: AudioSignal) -> Result<(), Box<dyn Error>> {
    let (tx, rx) = crossbeam_channel::unbounded::<Message>();
    let registry = AlarmRegistry::new(settings, audio, Arc::new(tx));
    let handle = registry.add(time)?;
    println!("Alarm set for {} ({})", handle.time, handle.time.display_12h());

    let mut input = io::stdin().lock();
    for message in rx {
        match message.kind {
            MessageType::Ringing { questions, dismiss } => {
                println!("Wake up! Solve this to turn off the alarm.");
                loop {
                    let question = questions.generate();
                    let correct = ask(&question, &mut input)?;
                    dismiss.dismiss(correct);
                    if correct {
                        break;
                    }
                    println!("Wrong! The correct answer was {}. Try again.", question.answer);
                }
            }
            MessageType::Completed => {
                info!("alarm {} done", message.alarm);
                println!("Correct! Alarm off.");
                break;
            }
        }
    }
    Ok(())
}

/// asks one question on stdin, true if it was answered correctly
fn ask(question: &Question, input: &mut impl BufRead) -> io::Result<bool> {
    println!("Question: {}", question.prompt);
    if let Some(options) = &question.options {
        for (i, option) in options.iter().enumerate() {
            println!("{}. {option}", i + 1);
        }
        print!("Your answer (1-4): ");
    } else {
        print!("Your answer: ");
    }
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(match question.options {
        Some(_) => line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|choice| choice.checked_sub(1))
            .is_some_and(|index| question.check_option(index)),
        None => question.check(&line),
    })
}
