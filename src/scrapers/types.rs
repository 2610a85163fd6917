/// Where to crawl and where to write the result
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Origin used to resolve site-relative links
    pub base_url: String,
    /// Index page listing every area
    pub areas_url: String,
    /// Substring identifying area links
    pub area_marker: String,
    /// Substring identifying property links
    pub property_marker: String,
    /// Index pages that match the markers but are not areas or properties
    pub areas_index_url: String,
    pub properties_index_url: String,
    pub user_agent: String,
    pub output_path: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hoas.fi".to_string(),
            areas_url: "https://hoas.fi/alueet/".to_string(),
            area_marker: "/alueet/".to_string(),
            property_marker: "/kohteet/".to_string(),
            areas_index_url: "https://hoas.fi/alueet/".to_string(),
            properties_index_url: "https://hoas.fi/kohteet/".to_string(),
            user_agent: concat!(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 ",
                "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            )
            .to_string(),
            output_path: "with_grade.csv".to_string(),
        }
    }
}

impl CrawlConfig {
    /// Point the crawl at another origin, keeping the same path layout
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        self.areas_url = format!("{}/alueet/", base_url);
        self.areas_index_url = format!("{}/alueet/", base_url);
        self.properties_index_url = format!("{}/kohteet/", base_url);
        self.base_url = base_url;
        self
    }

    /// Turn a site-relative href into an absolute URL
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url.trim_end_matches('/'), href)
        } else {
            format!("{}/{}", self.base_url.trim_end_matches('/'), href)
        }
    }

    /// Path shown in progress logs, e.g. `/kannelmaki/` for an area URL
    pub fn short_path<'a>(&self, url: &'a str, marker: &str) -> &'a str {
        if marker.is_empty() {
            return url;
        }
        match url.find(marker) {
            Some(pos) => &url[pos + marker.len() - 1..],
            None => url,
        }
    }
}

/// CSS locators and marker strings for the property page markup.
///
/// Every lookup the extractor performs is listed here, so a markup change
/// only touches this table.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    pub services: String,
    pub condition_span: String,
    pub condition_marker: String,
    pub basic_info: String,
    pub basic_info_row: String,
    pub basic_info_label: String,
    pub basic_info_value: String,
    pub energy_class_label: String,
    pub renovation_year_label: String,
    pub building_year_label: String,
    pub location: String,
    pub rating: String,
    pub rating_suffix: String,
    pub apartments: String,
    pub apartment_type: String,
    pub apartment_type_name: String,
    pub apartment_entry: String,
    pub address: String,
    pub surface_area: String,
    pub surface_area_suffix: String,
    pub count: String,
    pub count_suffix: String,
    pub rent: String,
    pub rent_suffix: String,
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self {
            services: "div.services_list".to_string(),
            condition_span: "span".to_string(),
            condition_marker: "Kohteen kunto:".to_string(),
            basic_info: "div.property-table.w-100.col-12".to_string(),
            basic_info_row: "div.row".to_string(),
            basic_info_label: "div.col-12.col-md-3".to_string(),
            basic_info_value: "div.col-12.col-md-9".to_string(),
            energy_class_label: "Energialuokka".to_string(),
            renovation_year_label: "Perusparannusvuosi".to_string(),
            building_year_label: "Rakennusvuosi".to_string(),
            location: "span.location".to_string(),
            rating: "span.rating".to_string(),
            rating_suffix: "/5".to_string(),
            apartments: "div.element-property-apartments-listing--content".to_string(),
            apartment_type: "div.single-container".to_string(),
            apartment_type_name: "div.type".to_string(),
            apartment_entry: "div.element-block.apartment-info".to_string(),
            address: "div.apartment-address".to_string(),
            surface_area: "div.surface-area".to_string(),
            surface_area_suffix: "m²".to_string(),
            count: "div.count".to_string(),
            count_suffix: "kpl".to_string(),
            rent: "div.rent".to_string(),
            rent_suffix: "€".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links() {
        let config = CrawlConfig::default();
        assert_eq!(
            config.absolute_url("/kohteet/kitarakuja-1/"),
            "https://hoas.fi/kohteet/kitarakuja-1/"
        );
        assert_eq!(
            config.absolute_url("https://hoas.fi/alueet/kannelmaki/"),
            "https://hoas.fi/alueet/kannelmaki/"
        );
    }

    #[test]
    fn rebasing_moves_index_urls() {
        let config = CrawlConfig::default().with_base_url("http://localhost:8080/");
        assert_eq!(config.areas_url, "http://localhost:8080/alueet/");
        assert_eq!(config.properties_index_url, "http://localhost:8080/kohteet/");
        assert_eq!(config.absolute_url("/alueet/x/"), "http://localhost:8080/alueet/x/");
    }

    #[test]
    fn short_path_keeps_leading_slash() {
        let config = CrawlConfig::default();
        assert_eq!(
            config.short_path("https://hoas.fi/alueet/kannelmaki/", "/alueet/"),
            "/kannelmaki/"
        );
        assert_eq!(config.short_path("elsewhere", "/alueet/"), "elsewhere");
        assert_eq!(
            config.short_path("https://hoas.fi/alueet/", ""),
            "https://hoas.fi/alueet/"
        );
    }
}
