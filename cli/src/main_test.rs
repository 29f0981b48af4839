use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("pro-cli").chain(args.iter().copied())).unwrap()
}

#[test]
fn gateway_and_event_id_parse_as_top_level_commands() {
    assert!(matches!(parse(&["gateway", "15", "--via"]).command, Command::Gateway { id: 15, via: true, .. }));
    assert!(matches!(parse(&["event-id", "bitcoin"]).command, Command::EventId { code } if code == "bitcoin"));
}

#[test]
fn catalog_commands_are_flattened() {
    let cli = parse(&["plans", "--filter", "core", "--duration", "monthly"]);
    assert!(matches!(
        cli.command,
        Command::Catalog(CatalogCommand::Plans { filter, duration: DurationTag::Monthly }) if filter == "core"
    ));
    assert!(matches!(parse(&["info"]).command, Command::Catalog(CatalogCommand::Info)));
    assert!(matches!(
        parse(&["plan", "2", "--months", "12"]).command,
        Command::Catalog(CatalogCommand::Plan { level: 2, months: 12 })
    ));
}

#[test]
fn plans_defaults_to_all_any() {
    assert!(matches!(
        parse(&["plans"]).command,
        Command::Catalog(CatalogCommand::Plans { filter, duration: DurationTag::Any }) if filter == names::ALL
    ));
}

#[test]
fn api_url_override_is_normalized() {
    let cli = parse(&["--api-url", " http://127.0.0.1:8080// ", "info"]);
    let mut config = LoaderConfig::default();
    config.set_api_url(cli.api_url.as_deref().unwrap_or_default());
    assert_eq!(config.api_url, "http://127.0.0.1:8080/");
}

#[test]
fn unknown_duration_is_rejected() {
    assert!(Cli::try_parse_from(["pro-cli", "plans", "--duration", "weekly"]).is_err());
}
