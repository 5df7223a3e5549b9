use clap::Parser;

/// This is an election collation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file describing the election: geography, offices, candidates, agents and
    /// optionally the tallies, approvals and electoral commission totals. Only JSON is supported.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the expected summary in JSON format. If provided, collate will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the election file.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the tallies are read from this file instead of the
    /// tally sources listed in the election file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, all the collation records are cleared after the run and the number of
    /// cleared records is reported.
    #[clap(long, takes_value = false)]
    pub clear: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
