use regex::Regex;

/// Lesson content is either prose or a link to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonContent<'a> {
    Text(&'a str),
    Video { url: &'a str, embed: String },
}

impl<'a> LessonContent<'a> {
    pub fn classify(content: &'a str) -> Self {
        if content.starts_with("http") {
            LessonContent::Video {
                url: content,
                embed: embed_url(content),
            }
        } else {
            LessonContent::Text(content)
        }
    }
}

// youtube.com/watch?v=<id>[&...] and youtu.be/<id>[?...]
pub fn embed_url(url: &str) -> String {
    let watch = Regex::new(r"^(?P<scheme>https?://)(?:www\.)?youtube\.com/watch\?v=(?P<id>[^&#]+)")
        .unwrap();
    let short = Regex::new(r"^(?P<scheme>https?://)youtu\.be/(?P<id>[^?&#]+)").unwrap();

    if let Some(caps) = watch.captures(url).or_else(|| short.captures(url)) {
        return format!("{}www.youtube.com/embed/{}", &caps["scheme"], &caps["id"]);
    }
    url.to_string()
}
