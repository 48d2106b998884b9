use super::error::RoutingError;
use super::response::{OsrmResponse, RouteResponse, SummaryResponse};

pub(super) fn parse_full_response(resp: OsrmResponse) -> Result<RouteResponse, RoutingError> {
    if resp.code != "Ok" {
        return Err(RoutingError::Upstream(resp.code));
    }

    let routes = resp
        .routes
        .ok_or_else(|| RoutingError::MalformedResponse("missing routes[]".into()))?;
    let route = routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::MalformedResponse("routes[] was empty".into()))?;

    let geometry = route
        .geometry
        .ok_or_else(|| RoutingError::MalformedResponse("missing routes[0].geometry".into()))?;
    let leg = route
        .legs
        .and_then(|legs| legs.into_iter().next())
        .ok_or_else(|| RoutingError::MalformedResponse("missing routes[0].legs[0]".into()))?;
    let annotation = leg
        .annotation
        .ok_or_else(|| RoutingError::MalformedResponse("missing legs[0].annotation".into()))?;

    let coordinates_lat_lon: Vec<(f64, f64)> = geometry
        .coordinates
        .iter()
        .map(|[lon, lat]| (*lat, *lon))
        .collect();

    if coordinates_lat_lon.len() < 2 {
        return Err(RoutingError::EmptyRoute);
    }

    let seg_dist_m = annotation
        .distance
        .ok_or_else(|| RoutingError::MalformedResponse("missing annotation.distance".into()))?;
    let seg_time_s = annotation
        .duration
        .ok_or_else(|| RoutingError::MalformedResponse("missing annotation.duration".into()))?;

    Ok(RouteResponse {
        distance_m: route.distance,
        duration_s: route.duration,
        coordinates_lat_lon,
        seg_dist_m,
        seg_time_s,
    })
}

pub(super) fn parse_summary_response(resp: OsrmResponse) -> Result<SummaryResponse, RoutingError> {
    if resp.code != "Ok" {
        return Err(RoutingError::Upstream(resp.code));
    }
    let route = resp
        .routes
        .and_then(|routes| routes.into_iter().next())
        .ok_or_else(|| RoutingError::MalformedResponse("routes[] was empty".into()))?;

    Ok(SummaryResponse {
        distance_m: route.distance,
        duration_s: route.duration,
    })
}
