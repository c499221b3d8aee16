pub mod titledate;

pub use titledate::{bulletin_sort_key, date_from_title, display_date, sermon_sort_key};

use crate::storage::{NewsPost, SermonPost};
use crate::sync::{CATEGORY_DAWN, CATEGORY_SUNDAY};

/// Title keyword marking Sunday worship videos whose category label was
/// never set (manually registered entries)
const KEYWORD_SUNDAY: &str = "주일";
/// Title keyword marking dawn worship videos
const KEYWORD_DAWN: &str = "새벽";

/// Sunday worship sermons, newest first by title date
pub fn sunday_sermons(all: &[SermonPost]) -> Vec<SermonPost> {
    select_sermons(all, CATEGORY_SUNDAY, KEYWORD_SUNDAY)
}

/// Dawn worship sermons, newest first by title date
pub fn dawn_sermons(all: &[SermonPost]) -> Vec<SermonPost> {
    select_sermons(all, CATEGORY_DAWN, KEYWORD_DAWN)
}

fn select_sermons(all: &[SermonPost], category: &str, keyword: &str) -> Vec<SermonPost> {
    let mut selected: Vec<SermonPost> = all
        .iter()
        .filter(|s| s.preacher == category || s.title.contains(keyword))
        .cloned()
        .collect();
    selected.sort_by(|a, b| sermon_sort_key(&b.title).cmp(&sermon_sort_key(&a.title)));
    selected
}

/// Bulletin posts ordered newest first by the numeric title prefix
pub fn sort_news(mut news: Vec<NewsPost>) -> Vec<NewsPost> {
    news.sort_by(|a, b| bulletin_sort_key(&b.title).cmp(&bulletin_sort_key(&a.title)));
    news
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sermon(title: &str, preacher: &str) -> SermonPost {
        SermonPost {
            id: title.to_string(),
            title: title.to_string(),
            youtube_url: format!("https://www.youtube.com/watch?v={}", title),
            video_id: String::new(),
            thumbnail_url: None,
            preacher: preacher.to_string(),
            published_at: None,
            created_at: String::new(),
        }
    }

    fn news(title: &str) -> NewsPost {
        NewsPost {
            id: title.to_string(),
            title: title.to_string(),
            content: String::new(),
            image_url: String::new(),
            link_url: None,
            drive_file_id: None,
            published_at: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_sermons_split_by_category_label_or_keyword() {
        let all = vec![
            sermon("2025.11.23 주일설교", CATEGORY_SUNDAY),
            sermon("2025.11.20 새벽예배", CATEGORY_DAWN),
            sermon("2025.11.16 주일 말씀", ""),
        ];

        let sunday = sunday_sermons(&all);
        assert_eq!(sunday.len(), 2);
        assert_eq!(sunday[0].title, "2025.11.23 주일설교");
        assert_eq!(sunday[1].title, "2025.11.16 주일 말씀");

        let dawn = dawn_sermons(&all);
        assert_eq!(dawn.len(), 1);
        assert_eq!(dawn[0].title, "2025.11.20 새벽예배");
    }

    #[test]
    fn test_undated_sermons_sort_last() {
        let all = vec![
            sermon("특별 주일 찬양", CATEGORY_SUNDAY),
            sermon("2024.05.05 주일설교", CATEGORY_SUNDAY),
        ];
        let sunday = sunday_sermons(&all);
        assert_eq!(sunday[0].title, "2024.05.05 주일설교");
        assert_eq!(sunday[1].title, "특별 주일 찬양");
    }

    #[test]
    fn test_news_ordering_mixes_legacy_and_dated_prefixes() {
        let sorted = sort_news(vec![
            news("행사 안내"),
            news("1123_주일주보"),
            news("260105_주일주보"),
        ]);
        let titles: Vec<&str> = sorted.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["260105_주일주보", "1123_주일주보", "행사 안내"]);
    }
}
