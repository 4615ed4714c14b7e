use std::{
    env,
    io::{self, BufRead, Write},
    process,
    sync::{mpsc, Arc},
};

use load_balancer_net::{
    contracts::Envelope, data_types::OPERATOR_RANK, listing::TaskListing,
    sockets::tcp_transport::TcpTransport,
};
use load_balancer_operator::{
    client::Operator,
    commands::{self, Command, CommandError},
    report_printer::ReportPrinter,
    settings::Settings,
};
use log::{error, info, warn, LevelFilter};

fn main() {
    let mut builder = colog::default_builder();
    #[cfg(debug_assertions)]
    builder.filter_level(LevelFilter::Debug);
    #[cfg(not(debug_assertions))]
    builder.filter_level(LevelFilter::Warn);
    builder.init();

    // 1st command line arg is the name of the environment
    let args: Vec<String> = env::args().collect();
    let environment = match args.get(1) {
        Some(s) => s.as_str(),
        None => "dev",
    };

    let settings = match Settings::load(environment) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid settings. {e:?}");
            process::exit(1);
        }
    };

    let (sender, receiver) = mpsc::channel::<Envelope>();
    let transport = match TcpTransport::bind(OPERATOR_RANK, &settings.peers, sender) {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!("Failed to start networking. {e:?}");
            process::exit(1);
        }
    };
    ReportPrinter::new(receiver, io::stdout()).start();

    let operator = Arc::new(Operator::new(transport.clone(), settings.peers.len()));

    // Ctrl-C takes the whole network down, the same as typing quit
    let handler_operator = operator.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_operator.terminate();
        process::exit(0);
    }) {
        warn!("Ctrl-C will not terminate the network. {e}");
    }

    println!("{}", commands::HELP);
    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match commands::parse(&line) {
            Ok(Command::Place(command_line)) => {
                if let Err(e) = operator.place(command_line) {
                    warn!("Placement failed. {e:?}");
                }
            }
            Ok(Command::List(format)) => {
                println!("{}", TaskListing::header(format));
                operator.list(format);
            }
            Ok(Command::Signal { signal, global_id }) => {
                if let Err(e) = operator.signal(signal, global_id) {
                    warn!("Signal failed. {e:?}");
                }
            }
            Ok(Command::Nodes) => {
                operator.presence();
            }
            Ok(Command::Help) => println!("{}", commands::HELP),
            Ok(Command::Quit) => break,
            Err(CommandError::Empty) => {}
            Err(CommandError::Unknown { word }) => println!("Unknown command '{word}', type help"),
            Err(CommandError::Usage { msg }) => println!("Usage: {msg}"),
        }
    }

    let count = operator.terminate();
    info!("Operator: Terminated {count} workers");
    transport.stop();
}
