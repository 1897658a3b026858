use clap::{Arg, ArgMatches, Command}; // Builder API for command-line parsing
use rpassword::read_password; // Passwords are read without echo
use std::error::Error;
use std::path::Path;
use zeroize::Zeroizing;

use gatekeeper::auth::AuthToken;
use gatekeeper::security::{HmacSignatureService, KeyringKeyService, OsRandom};
use gatekeeper::utils::logging::{format_secure_id, initialize_logging};
use gatekeeper::{
    EnrollRequest, FilePasswordStore, GateKeeper, GateKeeperConfig, PasswordFileStore,
    PasswordHandle, UserId, VerifyRequest,
};

fn cli() -> Command {
    let uid = Arg::new("uid")
        .long("uid")
        .help("Platform user id owning the password file")
        .value_name("UID")
        .value_parser(clap::value_parser!(u32))
        .required(true);

    let handle = Arg::new("handle")
        .long("handle")
        .help("Hex-encoded password handle to present instead of the stored one")
        .value_name("HEX");

    Command::new("gatekeeper")
        .about("Password enrollment and verification authority")
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a JSON configuration file")
                .value_name("PATH")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("enroll")
                .about("Enroll a new password, re-using the current secure identity if one exists")
                .arg(uid.clone())
                .arg(handle.clone()),
        )
        .subcommand(
            Command::new("verify")
                .about("Verify a password and print the resulting auth token")
                .arg(uid.clone())
                .arg(handle),
        )
        .subcommand(
            Command::new("show")
                .about("Print the decoded password handle stored for a user")
                .arg(uid),
        )
}

/// Prompt for a password on the terminal
fn prompt_password(prompt: &str) -> Result<Zeroizing<Vec<u8>>, Box<dyn Error>> {
    println!("{}", prompt);
    let password = Zeroizing::new(read_password()?);
    Ok(Zeroizing::new(password.as_bytes().to_vec()))
}

fn uid_arg(matches: &ArgMatches) -> Result<UserId, Box<dyn Error>> {
    matches
        .get_one::<u32>("uid")
        .copied()
        .ok_or_else(|| "missing --uid".into())
}

/// Handle given on the command line, or the one in the password file
fn presented_handle(
    matches: &ArgMatches,
    store: &FilePasswordStore,
    uid: UserId,
) -> Result<Option<Vec<u8>>, Box<dyn Error>> {
    match matches.get_one::<String>("handle") {
        Some(encoded) => Ok(Some(hex::decode(encoded.trim())?)),
        None => Ok(store.read_password_file(uid)?),
    }
}

fn handle_enroll(
    gatekeeper: &GateKeeper,
    store: &FilePasswordStore,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let uid = uid_arg(matches)?;
    let current = presented_handle(matches, store, uid)?;

    let enrolled_password = match current {
        Some(_) => Some(prompt_password("Enter current password:")?),
        None => None,
    };

    let new_password = prompt_password("Enter new password:")?;
    let confirm = prompt_password("Confirm new password:")?;
    if *new_password != *confirm {
        return Err("Passwords don't match".into());
    }

    let mut request = EnrollRequest::new(uid, new_password.to_vec());
    request.password_handle = current;
    request.enrolled_password = enrolled_password;

    let response = gatekeeper
        .enroll(&request)
        .map_err(|e| format!("Enrollment failed: {}", e))?;
    let handle = PasswordHandle::from_bytes(&response.enrolled_password_handle)?;

    println!("Password enrolled for uid {}", uid);
    println!("Secure id: {}", format_secure_id(handle.secure_id));
    println!("Handle: {}", hex::encode(&response.enrolled_password_handle));
    Ok(())
}

fn handle_verify(
    gatekeeper: &GateKeeper,
    store: &FilePasswordStore,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let uid = uid_arg(matches)?;
    let handle = presented_handle(matches, store, uid)?
        .ok_or_else(|| format!("No password enrolled for uid {}", uid))?;

    let password = prompt_password("Enter password:")?;
    let request = VerifyRequest::new(uid, handle, password.to_vec());

    let response = gatekeeper
        .verify(&request)
        .map_err(|e| format!("Verification failed: {}", e))?;
    let token = AuthToken::from_bytes(&response.auth_token)?;

    println!("Password verified for uid {}", uid);
    if !response.identity_verified {
        println!("Warning: handle does not match the password file, token carries identity 0");
    }
    println!("Timestamp: {}", token.timestamp);
    println!("Auth token: {}", hex::encode(&response.auth_token));
    Ok(())
}

fn handle_show(store: &FilePasswordStore, matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let uid = uid_arg(matches)?;
    match store.read_password_file(uid)? {
        Some(bytes) => {
            let handle = PasswordHandle::from_bytes(&bytes)?;
            println!("Password file: {}", store.file_path(uid).display());
            println!("Version: {}", handle.version);
            println!("Secure id: {}", format_secure_id(handle.secure_id));
            println!("Authenticator id: {}", format_secure_id(handle.authenticator_id));
        }
        None => println!("No password enrolled for uid {}", uid),
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(Path::new);
    let config = GateKeeperConfig::load_or_default(config_path)?;
    initialize_logging(&config.log_level, config.log_file.as_deref())?;

    let store = FilePasswordStore::open(&config.store_dir)?;

    match matches.subcommand() {
        Some(("show", sub_matches)) => handle_show(&store, sub_matches),
        Some((name, sub_matches)) => {
            let keys = KeyringKeyService::new(&config.keyring_service)?;
            keys.initialize_if_needed(&OsRandom)?;

            let gatekeeper = GateKeeper::new(keys, store.clone())
                .with_signer(HmacSignatureService::new(config.pbkdf2_rounds));

            match name {
                "enroll" => handle_enroll(&gatekeeper, &store, sub_matches),
                "verify" => handle_verify(&gatekeeper, &store, sub_matches),
                other => Err(format!("Unknown command: {}", other).into()),
            }
        }
        None => Err("No command given".into()),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
