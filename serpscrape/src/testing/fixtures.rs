//! HTML fixtures.

/// A results page in the default engine layout: three results, the second
/// without a snippet, plus a container with no link.
pub const SEARCH_RESULTS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>foo - Search</title></head>
<body>
  <div id="search">
    <div class="g"><div class="tF2Cxc">
      <div class="yuRUbf"><a href="http://a.test"><h3>Result A</h3></a></div>
      <div class="VwiC3b">Snippet for A</div>
    </div></div>
    <div class="g"><div class="tF2Cxc">
      <div class="yuRUbf"><a href="http://b.test"><h3>Result B</h3></a></div>
    </div></div>
    <div class="g"><div class="tF2Cxc">
      <span>People also ask</span>
    </div></div>
    <div class="g"><div class="tF2Cxc">
      <div class="yuRUbf"><a href="http://c.test"><h3>Result C</h3></a></div>
      <div class="VwiC3b">Snippet for C</div>
    </div></div>
  </div>
</body>
</html>"#;

/// A results page returning `a.test` with snippet "A" and `b.test` with "B".
pub const TWO_RESULTS_PAGE: &str = r#"<html><body>
  <div class="tF2Cxc"><a href="http://a.test">A</a><div class="VwiC3b">A</div></div>
  <div class="tF2Cxc"><a href="http://b.test">B</a><div class="VwiC3b">B</div></div>
</body></html>"#;

/// A page exercising every structured field.
pub const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title> Sample Page </title>
  <meta name="description" content="A page used in tests">
  <meta property="og:title" content="Sample OG">
  <meta name="viewport">
</head>
<body>
  <h1>Sample heading</h1>
  <p>First paragraph.</p>
  <p>Second paragraph with a <a href="/about">link</a>.</p>
  <a href="https://other.test/page">Elsewhere</a>
  <img src="/logo.png" alt="Logo">
  <img alt="no source">
  <ul><li>Apple</li><li>Banana</li></ul>
  <ol><li>Step one</li><li>Step two</li></ol>
  <table>
    <caption>Prices</caption>
    <tr><th>Item</th><th>Price</th></tr>
    <tr><td>Tea</td><td>2</td></tr>
    <tr><td>Total</td></tr>
  </table>
</body>
</html>"#;

/// A page with no anchors carrying an `href`.
pub const PAGE_WITHOUT_LINKS: &str = r"<html>
<head><title>No links</title></head>
<body><p>Nothing to follow here.</p><a name='top'>anchor without target</a></body>
</html>";

/// A page with one `h1` and two `h2` headings.
pub const REPEATED_HEADINGS: &str = r"<html><body>
  <h1>Main title</h1>
  <h2>First section</h2>
  <p>Body.</p>
  <h2>Second section</h2>
</body></html>";

/// Two tables without captions, one data row each.
pub const TWO_UNCAPTIONED_TABLES: &str = r"<html><body>
  <table>
    <tr><th>First</th></tr>
    <tr><td>from table one</td></tr>
  </table>
  <table>
    <tr><th>Second</th></tr>
    <tr><td>from table two</td></tr>
  </table>
</body></html>";

/// A news-style article inside `<article>`, surrounded by navigation,
/// share buttons and a footer.
pub const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>How Rivers Shape Valleys | Earth Notes</title></head>
<body>
  <nav class="site-nav"><a href="/">Home</a> <a href="/topics">Topics</a></nav>
  <article class="story">
    <header><h1>How Rivers Shape Valleys</h1></header>
    <p>Rivers carve valleys over thousands of years by wearing away the rock and soil beneath them.
       The faster the water moves, the more sediment it can carry downstream.</p>
    <p>Where the gradient is steep the valley takes a V shape, while slow meandering rivers
       spread sideways and build wide flood plains covered in fertile silt.</p>
    <blockquote>Water is the driving force of all nature.</blockquote>
    <div class="share-buttons"><p>Share this article with your friends</p></div>
  </article>
  <footer><p>Copyright 2024 Earth Notes. All rights reserved.</p></footer>
</body>
</html>"#;

/// An article with no semantic container; the main node must be found by scoring.
pub const SCORED_ARTICLE_PAGE: &str = r#"<html>
<head><title>Scored story</title></head>
<body>
  <div id="wrapper">
    <div class="sidebar"><p>Sidebar links and some more words here</p></div>
    <div class="story-body">
      <p>The first real paragraph has plenty of words in it to score well.</p>
      <p>The second real paragraph also carries enough words to count.</p>
      <p>Hi.</p>
    </div>
    <div class="related-posts"><p>Related stories you may like to read next</p></div>
  </div>
</body>
</html>"#;
