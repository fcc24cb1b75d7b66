use clap::Parser;

/// Parses the command line arguments into `T`
pub fn parse_args<T: Parser>() -> Result<T, clap::Error> {
    T::try_parse()
}
