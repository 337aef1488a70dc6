//! Level leaderboard with stable ordering and clamped pagination.
//!
//! Accounts sort by level descending, then by id ascending, so repeated
//! calls over the same snapshot always produce the same pages.

use serde::{Deserialize, Serialize};

use orbis_core::constants::RANK_PAGE_SIZE;
use orbis_core::{Account, AccountId};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    /// 1-based position across the whole leaderboard.
    pub position: usize,
    pub id: AccountId,
    pub level: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RankPage {
    pub entries: Vec<RankEntry>,
    /// Page actually served after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_accounts: usize,
}

impl RankPage {
    /// True when there is nothing to rank; callers report "no data".
    pub fn is_empty(&self) -> bool {
        self.total_accounts == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RankingService {
    pub page_size: usize,
}

impl Default for RankingService {
    fn default() -> Self {
        Self {
            page_size: RANK_PAGE_SIZE,
        }
    }
}

impl RankingService {
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }

    /// Rank `accounts` and return the requested page, clamped into
    /// `[1, total_pages]`. Zero accounts yield one empty page.
    pub fn rank(&self, mut accounts: Vec<Account>, requested_page: i64) -> RankPage {
        let page_size = self.page_size.max(1);
        let total_accounts = accounts.len();
        let total_pages = total_accounts.div_ceil(page_size).max(1);
        let page = requested_page.clamp(1, total_pages as i64) as usize;

        accounts.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| a.id.cmp(&b.id)));

        let start = (page - 1) * page_size;
        let entries = accounts
            .into_iter()
            .enumerate()
            .skip(start)
            .take(page_size)
            .map(|(i, account)| RankEntry {
                position: i + 1,
                id: account.id,
                level: account.level,
            })
            .collect();

        RankPage {
            entries,
            page,
            total_pages,
            total_accounts,
        }
    }
}
