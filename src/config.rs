/// Rows and columns of every board.
pub const BOARD_SIZE: usize = 10;

/// Ship lengths each player places when no override is given.
pub const DEFAULT_FLEET: [usize; 5] = [5, 4, 3, 3, 2];

/// Environment variable holding the log level (`error`, `warn`, `info`, ...).
pub const LOG_ENV: &str = "TORPEDO_LOG";

/// Default address of the relay for both `relay --bind` and `play --connect`.
pub const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:5000";

/// Parse a comma separated fleet description such as `"5,4,3,3,2"`.
///
/// Every entry must be a positive length that fits on the board.
pub fn parse_fleet(text: &str) -> anyhow::Result<Vec<usize>> {
    let mut lengths = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        let length: usize = part
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid ship length {:?}", part))?;
        if length == 0 || length > BOARD_SIZE {
            anyhow::bail!("ship length {} must be between 1 and {}", length, BOARD_SIZE);
        }
        lengths.push(length);
    }
    Ok(lengths)
}
